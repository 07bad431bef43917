//! Dotted field paths such as `a.b.c`.

use std::fmt;

use crate::lexer::is_identifier;

/// A sequence of field labels used to navigate struct values.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Path {
    pub labels: Vec<String>,
}

impl Path {
    /// The empty path, denoting the root value.
    pub fn root() -> Self {
        Self::default()
    }

    /// Split a dotted path. Empty segments are dropped, so `a..b` and `a.b.`
    /// both mean `a.b`.
    pub fn parse(s: &str) -> Self {
        Path {
            labels: s
                .split('.')
                .filter(|label| !label.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Path {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.labels.iter()
    }

    /// A new path with `label` appended.
    pub fn child(&self, label: impl Into<String>) -> Path {
        let mut labels = self.labels.clone();
        labels.push(label.into());
        Path { labels }
    }

    /// The path without its last label, or `None` for the root.
    pub fn parent(&self) -> Option<Path> {
        if self.labels.is_empty() {
            return None;
        }
        Some(Path {
            labels: self.labels[..self.labels.len() - 1].to_vec(),
        })
    }

    pub fn last(&self) -> Option<&str> {
        self.labels.last().map(String::as_str)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, label) in self.labels.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            if is_identifier(label) {
                write!(f, "{}", label)?;
            } else {
                write!(f, "{:?}", label)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_on_dots() {
        let path = Path::parse("a.b.c");
        assert_eq!(path.labels, vec!["a", "b", "c"]);
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn parse_normalizes_empty_segments() {
        assert_eq!(Path::parse("a..b."), Path::parse("a.b"));
        assert!(Path::parse("").is_empty());
    }

    #[test]
    fn child_and_parent() {
        let path = Path::parse("a.b");
        assert_eq!(path.child("c"), Path::parse("a.b.c"));
        assert_eq!(path.parent(), Some(Path::parse("a")));
        assert_eq!(Path::root().parent(), None);
        assert_eq!(path.last(), Some("b"));
    }

    #[test]
    fn iter_runs_both_ways() {
        let path = Path::parse("a.b.c");
        let reversed: Vec<&String> = path.iter().rev().collect();
        assert_eq!(reversed, ["c", "b", "a"]);
    }

    #[test]
    fn display_quotes_non_identifiers() {
        let path = Path::from_labels(["a", "b-c"]);
        assert_eq!(path.to_string(), "a.\"b-c\"");
    }
}
