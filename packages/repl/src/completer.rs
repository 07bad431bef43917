use std::sync::{Arc, Mutex};

use reedline::{Completer, Span, Suggestion};

use crate::commands::{find_command, PREFIX};
use crate::presentation::{completion_candidates, completion_fragment};

/// Top-level labels of the current value, refreshed by the loop before each
/// prompt. Shared because reedline requires completers to be `Send`.
pub type LabelCache = Arc<Mutex<Vec<String>>>;

/// Completer for commands and field labels.
pub struct ReplCompleter {
    labels: LabelCache,
}

impl ReplCompleter {
    pub fn new(labels: LabelCache) -> Self {
        Self { labels }
    }

    fn cached_labels(&self) -> Vec<String> {
        // A poisoned cache only costs completions.
        self.labels
            .lock()
            .map(|labels| labels.clone())
            .unwrap_or_default()
    }
}

impl Completer for ReplCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let line_to_pos = &line[..pos];
        let start = pos - completion_fragment(line_to_pos).len();

        completion_candidates(line_to_pos, || self.cached_labels())
            .into_iter()
            .map(|value| Suggestion {
                description: describe(&value),
                value,
                style: None,
                extra: None,
                span: Span::new(start, pos),
                append_whitespace: false,
                match_indices: None,
                ..Default::default()
            })
            .collect()
    }
}

fn describe(candidate: &str) -> Option<String> {
    let name = candidate.strip_prefix(PREFIX)?;
    find_command(name).map(|spec| spec.summary.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completer(labels: &[&str]) -> ReplCompleter {
        let cache = Arc::new(Mutex::new(
            labels.iter().map(|l| l.to_string()).collect(),
        ));
        ReplCompleter::new(cache)
    }

    fn values(suggestions: &[Suggestion]) -> Vec<&str> {
        suggestions.iter().map(|s| s.value.as_str()).collect()
    }

    #[test]
    fn completes_command_names() {
        let mut completer = completer(&[]);
        let suggestions = completer.complete(":pri", 4);
        assert_eq!(values(&suggestions), vec![":print"]);
        assert_eq!(suggestions[0].span, Span::new(0, 4));
        assert_eq!(
            suggestions[0].description.as_deref(),
            Some("Print the current value")
        );
    }

    #[test]
    fn aliases_share_the_command_description() {
        let mut completer = completer(&[]);
        let suggestions = completer.complete(":", 1);
        let description = |value: &str| {
            suggestions
                .iter()
                .find(|s| s.value == value)
                .and_then(|s| s.description.clone())
        };
        assert_eq!(description(":q"), description(":exit"));
        assert_eq!(description(":quit").as_deref(), Some("Leave the session"));
        assert!(suggestions.iter().all(|s| s.description.is_some()));
    }

    #[test]
    fn completes_labels_from_cache() {
        let mut completer = completer(&["alpha", "beta"]);
        let suggestions = completer.complete("x + al", 6);
        assert_eq!(values(&suggestions), vec!["alpha"]);
        assert_eq!(suggestions[0].span, Span::new(4, 6));
        assert_eq!(suggestions[0].description, None);
    }

    #[test]
    fn sees_cache_updates() {
        let cache: LabelCache = Arc::new(Mutex::new(Vec::new()));
        let mut completer = ReplCompleter::new(Arc::clone(&cache));
        assert!(completer.complete("a", 1).is_empty());

        cache.lock().unwrap().push("answer".to_string());
        assert_eq!(values(&completer.complete("a", 1)), vec!["answer"]);
    }

    #[test]
    fn completes_only_up_to_cursor() {
        let mut completer = completer(&["alpha", "beta"]);
        let suggestions = completer.complete("b + alpha", 1);
        assert_eq!(values(&suggestions), vec!["beta"]);
        assert_eq!(suggestions[0].span, Span::new(0, 1));
    }
}
