//! # lattice-repl
//!
//! An interactive session for the Lattice configuration language.
//!
//! Declarations typed at the prompt accumulate into a live program;
//! expressions are evaluated against it without changing it; `:`-commands
//! inspect, save and restore its state.
//!
//! ## Features
//!
//! - Runs inside the Lattice project rooted at the working directory, or
//!   in freestyle mode
//! - Multi-line blocks between `"""` lines
//! - Checkpoint history with `:history`, `:save` and `:restore`
//! - Tab completion for commands and field labels
//! - Syntax highlighting
//! - Vi mode support (detected from EDITOR, .inputrc, or LATTICE_EDIT_MODE)
//! - Persistent line history
//!
//! ## Usage
//!
//! ```bash
//! lattice repl
//!
//! # Inside the REPL:
//! > a: 1
//! > a + 1
//! 2
//! > :lookup a
//! 1
//! ```

pub mod commands;
pub mod completer;
pub mod core;
pub mod error;
pub mod highlighter;
pub mod host;
pub mod input;
pub mod io;
pub mod presentation;
pub mod program;
pub mod session;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::{debug, warn};

use lattice_lang::LoadError;

pub use crate::core::ReplCore;
pub use error::{ReplError, StartupError};
pub use io::ExitReason;
pub use program::{Program, ResetSource};
pub use session::Session;

/// Directory under the user configuration directory holding REPL state.
pub const CONFIG_DIR: &str = "lattice";

const HISTORY_FILE: &str = "history.txt";

/// Run an interactive session on the terminal.
///
/// With `discover` set, a project rooted at the working directory becomes
/// the initial program; otherwise, or when there is none, the session starts
/// empty.
pub fn run(discover: bool) -> Result<ExitReason, StartupError> {
    let history_path = history_path().ok_or(StartupError::NoConfigDir)?;

    let session = if discover {
        discover_session()
    } else {
        Session::new()
    };

    let labels = Arc::new(Mutex::new(Vec::new()));
    let mut host =
        host::TerminalHost::new(&history_path, labels).map_err(StartupError::LineEditor)?;
    let mut core = ReplCore::new(session);
    Ok(core.run(&mut host)?)
}

fn history_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(HISTORY_FILE))
}

fn discover_session() -> Session {
    let dir = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            warn!("cannot read working directory: {}", e);
            return Session::new();
        }
    };

    match lattice_lang::discover(&dir) {
        Ok(project) => {
            debug!("loaded module {} from {}", project.module, project.root.display());
            let root = project.root.clone();
            Session::with_program(Program::from_project(project), ResetSource::Project(root))
        }
        Err(LoadError::NotAProject { .. }) => {
            debug!("no project at {}", dir.display());
            Session::new()
        }
        Err(e) => {
            warn!("cannot load project: {}", e);
            Session::new()
        }
    }
}
