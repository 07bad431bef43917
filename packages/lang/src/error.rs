//! Error types for the language layer.

use std::path::PathBuf;

use thiserror::Error;

use crate::token::Span;

/// Malformed source text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("{file}:{span}: unexpected character '{ch}'")]
    UnexpectedChar { file: String, ch: char, span: Span },

    #[error("{file}:{span}: unterminated string")]
    UnterminatedString { file: String, span: Span },

    #[error("{file}:{span}: invalid escape sequence '\\{ch}'")]
    InvalidEscape { file: String, ch: char, span: Span },

    #[error("{file}:{span}: invalid number '{text}'")]
    InvalidNumber {
        file: String,
        text: String,
        span: Span,
    },

    #[error("{file}:{span}: unexpected {found}, expected {expected}")]
    Unexpected {
        file: String,
        found: String,
        expected: String,
        span: Span,
    },

    #[error("{file}:{span}: nesting deeper than {limit} levels")]
    TooDeep {
        file: String,
        limit: usize,
        span: Span,
    },
}

/// Failure to build a program or evaluate an expression against it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("reference \"{name}\" not found")]
    UnresolvedReference { name: String },

    #[error("package \"{path}\" not found")]
    UnknownPackage { path: String },

    /// The evaluated result itself is an error value.
    #[error("{0}")]
    Bottom(String),
}

/// A value or syntax node that has no source representation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormatError {
    #[error("cannot format {what}")]
    Unrepresentable { what: String },
}

/// Failure to discover or load project files.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{} is not a lattice project (no lattice.mod directory)", dir.display())]
    NotAProject { dir: PathBuf },

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("invalid module file {}: {source}", path.display())]
    Module {
        path: PathBuf,
        #[source]
        source: EvalError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display_includes_location() {
        let e = ParseError::Unexpected {
            file: "repl".to_string(),
            found: "'}'".to_string(),
            expected: "expression".to_string(),
            span: Span::new(4, 1, 5),
        };
        assert_eq!(
            e.to_string(),
            "repl:1:5: unexpected '}', expected expression"
        );
    }

    #[test]
    fn eval_error_display() {
        let e = EvalError::UnresolvedReference {
            name: "zz".to_string(),
        };
        assert_eq!(e.to_string(), "reference \"zz\" not found");

        let e = EvalError::Bottom("conflicting values 1 and 2".to_string());
        assert_eq!(e.to_string(), "conflicting values 1 and 2");
    }

    #[test]
    fn load_error_wraps_parse_error() {
        let parse = ParseError::UnterminatedString {
            file: "a.lat".to_string(),
            span: Span::new(0, 1, 1),
        };
        let e: LoadError = parse.into();
        assert!(matches!(e, LoadError::Parse(_)));
        assert!(e.to_string().contains("a.lat"));
    }

    #[test]
    fn not_a_project_display() {
        let e = LoadError::NotAProject {
            dir: PathBuf::from("/tmp/x"),
        };
        assert!(e.to_string().contains("/tmp/x"));
        assert!(e.to_string().contains("lattice.mod"));
    }
}
