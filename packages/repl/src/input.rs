//! Input mode handling.
//!
//! Lines arrive one at a time. Most are dispatched immediately; a line holding
//! only [`TOGGLE`] opens a block whose lines are collected until the next
//! toggle and then dispatched together as one statement.

use lattice_lang::looks_like_declaration;

use crate::commands::PREFIX;

/// Opens and closes a multi-line block.
pub const TOGGLE: &str = "\"\"\"";

/// Forces the rest of the line to be added to the program.
pub const STATEMENT_PREFIX: char = '=';

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Normal,
    /// Inside a block, holding the lines typed so far.
    Accumulating(Vec<String>),
}

/// What a finished entry should be handed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Text after the command prefix.
    Command(String),
    Statement(String),
    Expression(String),
}

/// A finished entry: the text as it goes into line-edit history, and where
/// it is dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub text: String,
    pub dispatch: Dispatch,
}

#[derive(Debug, Default)]
pub struct InputController {
    mode: InputMode,
}

impl InputController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> &InputMode {
        &self.mode
    }

    pub fn is_accumulating(&self) -> bool {
        matches!(self.mode, InputMode::Accumulating(_))
    }

    /// Feed one raw line. Returns an entry once there is something to
    /// dispatch.
    pub fn feed(&mut self, line: &str) -> Option<Entry> {
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            return None;
        }

        if trimmed.trim_start() == TOGGLE {
            return match std::mem::take(&mut self.mode) {
                InputMode::Normal => {
                    self.mode = InputMode::Accumulating(Vec::new());
                    None
                }
                InputMode::Accumulating(lines) if lines.is_empty() => None,
                InputMode::Accumulating(lines) => {
                    let text = lines.join("\n");
                    Some(Entry {
                        dispatch: Dispatch::Statement(text.clone()),
                        text,
                    })
                }
            };
        }

        if let InputMode::Accumulating(lines) = &mut self.mode {
            lines.push(line.to_string());
            return None;
        }

        let text = trimmed.trim_start();
        let dispatch = if let Some(rest) = text.strip_prefix(PREFIX) {
            Dispatch::Command(rest.to_string())
        } else if let Some(rest) = text.strip_prefix(STATEMENT_PREFIX) {
            Dispatch::Statement(rest.trim().to_string())
        } else if looks_like_declaration(text) {
            Dispatch::Statement(text.to_string())
        } else {
            Dispatch::Expression(text.to_string())
        };
        Some(Entry {
            text: text.to_string(),
            dispatch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatch(line: &str) -> Dispatch {
        InputController::new().feed(line).unwrap().dispatch
    }

    #[test]
    fn classifies_single_lines() {
        assert_eq!(dispatch(":print"), Dispatch::Command("print".to_string()));
        assert_eq!(dispatch("  :l a  "), Dispatch::Command("l a".to_string()));
        assert_eq!(dispatch("a: 1"), Dispatch::Statement("a: 1".to_string()));
        assert_eq!(
            dispatch("let x = 2"),
            Dispatch::Statement("let x = 2".to_string())
        );
        assert_eq!(
            dispatch("import \"strings\""),
            Dispatch::Statement("import \"strings\"".to_string())
        );
        assert_eq!(dispatch("= b: 2"), Dispatch::Statement("b: 2".to_string()));
        assert_eq!(dispatch("a + 1"), Dispatch::Expression("a + 1".to_string()));
        assert_eq!(dispatch("a"), Dispatch::Expression("a".to_string()));
    }

    #[test]
    fn empty_lines_are_ignored() {
        let mut input = InputController::new();
        assert_eq!(input.feed(""), None);
        assert_eq!(input.feed("   \t"), None);
        assert_eq!(input.mode(), &InputMode::Normal);
    }

    #[test]
    fn block_collects_lines_verbatim() {
        let mut input = InputController::new();
        assert_eq!(input.feed("\"\"\""), None);
        assert!(input.is_accumulating());
        assert_eq!(input.feed("a: {"), None);
        assert_eq!(input.feed("    b: 1"), None);
        assert_eq!(input.feed(""), None);
        assert_eq!(input.feed(":print"), None);
        assert_eq!(input.feed("}"), None);

        let entry = input.feed("\"\"\"").unwrap();
        let text = "a: {\n    b: 1\n:print\n}".to_string();
        assert_eq!(entry.text, text);
        assert_eq!(entry.dispatch, Dispatch::Statement(text));
        assert!(!input.is_accumulating());
    }

    #[test]
    fn empty_block_dispatches_nothing() {
        let mut input = InputController::new();
        assert_eq!(input.feed("\"\"\""), None);
        assert_eq!(input.feed("\"\"\""), None);
        assert_eq!(input.mode(), &InputMode::Normal);
    }

    #[test]
    fn history_text_is_trimmed_line() {
        let entry = InputController::new().feed("  a + 1   ").unwrap();
        assert_eq!(entry.text, "a + 1");
    }
}
