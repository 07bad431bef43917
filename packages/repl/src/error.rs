//! Errors reported by the session.
//!
//! Every [`ReplError`] is caught where a line is dispatched and printed; none
//! of them end the session. [`StartupError`] covers the environment failures
//! that stop the binary before the loop starts.

use std::path::PathBuf;

use thiserror::Error;

use lattice_lang::{EvalError, FormatError, LoadError, ParseError};

use crate::io::IoError;

#[derive(Debug, Error)]
pub enum ReplError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Load(LoadError),

    #[error("usage: {usage}")]
    Usage { usage: &'static str },

    #[error("unknown command \"{0}\"; type :help for a list of commands")]
    UnknownCommand(String),

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("history index {index} out of range (0 to {last})")]
    HistoryIndex { index: i64, last: usize },
}

impl From<LoadError> for ReplError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::Parse(err) => ReplError::Parse(err),
            LoadError::Io { path, source } => ReplError::Io { path, source },
            other => ReplError::Load(other),
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("cannot determine the user configuration directory")]
    NoConfigDir,

    #[error("cannot initialize line editor: {0}")]
    LineEditor(#[source] std::io::Error),

    #[error(transparent)]
    Io(#[from] IoError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_errors_map_onto_session_errors() {
        let io = LoadError::Io {
            path: PathBuf::from("x.lat"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(matches!(ReplError::from(io), ReplError::Io { .. }));

        let not_project = LoadError::NotAProject {
            dir: PathBuf::from("/tmp"),
        };
        assert!(matches!(ReplError::from(not_project), ReplError::Load(_)));
    }

    #[test]
    fn messages() {
        assert_eq!(
            ReplError::Usage { usage: ":lookup <path>" }.to_string(),
            "usage: :lookup <path>"
        );
        assert_eq!(
            ReplError::HistoryIndex { index: 5, last: 2 }.to_string(),
            "history index 5 out of range (0 to 2)"
        );
    }
}
