//! I/O types for the REPL.
//!
//! These types define the interface between the REPL core and its host environment.

use serde::{Deserialize, Serialize};

/// A line of input from the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputLine {
    pub line: String,
}

/// A signal from the host (Ctrl+C, Ctrl+D).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "lowercase")]
pub enum Signal {
    /// User pressed Ctrl+C. `partial` is set when the line being edited
    /// had content, in which case only that line is discarded.
    Interrupt {
        #[serde(default)]
        partial: bool,
    },
    /// User pressed Ctrl+D (end of input).
    Eof,
}

/// Output to be written by the REPL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub text: String,
    #[serde(default)]
    pub style: OutputStyle,
}

impl Output {
    pub fn normal(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: OutputStyle::Normal,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: OutputStyle::Error,
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: OutputStyle::Info,
        }
    }

    pub fn banner(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: OutputStyle::Banner,
        }
    }
}

/// Style hint for output rendering.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    /// Normal output (already contains ANSI codes if applicable).
    #[default]
    Normal,
    /// Error message (host may add red prefix).
    Error,
    /// Informational message (host may style in cyan).
    Info,
    /// Banner/startup message.
    Banner,
}

/// Prompt configuration sent from core to host before every read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Inside a `"""` block; the host shows the continuation prompt.
    #[serde(default)]
    pub continuation: bool,
    /// Module name when running inside a project.
    #[serde(default)]
    pub module: Option<String>,
    /// Top-level labels of the current value, for completion.
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Reason the REPL exited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// User ran `:exit`.
    UserExit,
    /// User pressed Ctrl+D.
    Eof,
    /// User pressed Ctrl+C on an empty line.
    Interrupt,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_wire_format() {
        let json = serde_json::to_string(&Signal::Interrupt { partial: true }).unwrap();
        assert_eq!(json, r#"{"signal":"interrupt","partial":true}"#);

        let eof: Signal = serde_json::from_str(r#"{"signal":"eof"}"#).unwrap();
        assert_eq!(eof, Signal::Eof);

        let bare: Signal = serde_json::from_str(r#"{"signal":"interrupt"}"#).unwrap();
        assert_eq!(bare, Signal::Interrupt { partial: false });
    }

    #[test]
    fn output_style_defaults_to_normal() {
        let output: Output = serde_json::from_str(r#"{"text":"hi"}"#).unwrap();
        assert_eq!(output, Output::normal("hi"));

        let json = serde_json::to_string(&Output::error("bad")).unwrap();
        assert_eq!(json, r#"{"text":"bad","style":"error"}"#);
    }

    #[test]
    fn prompt_config_fields_are_optional() {
        let config: PromptConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, PromptConfig::default());
    }
}
