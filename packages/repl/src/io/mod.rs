//! I/O abstraction for the REPL.
//!
//! This module defines the interface between the REPL core and its host environment.
//! The core interacts only through the `IoHost` trait, so the same loop runs
//! against the terminal or against in-memory buffers in tests.

pub mod test_host;
pub mod types;

pub use test_host::TestHost;
pub use types::*;

/// Error type for I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(String),
}

/// Host interface for REPL I/O operations.
///
/// The REPL core calls these methods to interact with the user.
pub trait IoHost {
    /// Wait for input to become available.
    ///
    /// This may block (for terminal hosts) or return immediately (for test hosts).
    /// After this returns, `read_input()` should return `Some(InputLine)` if
    /// input is ready, or `read_signal()` should return `Some(Signal)` if a
    /// signal was received.
    fn wait_for_input(&mut self) -> Result<(), IoError>;

    /// Read the next input line, if available.
    fn read_input(&mut self) -> Result<Option<InputLine>, IoError>;

    /// Read any pending signal (Ctrl+C, Ctrl+D).
    fn read_signal(&mut self) -> Result<Option<Signal>, IoError>;

    /// Write output to the user.
    fn write_output(&mut self, output: Output) -> Result<(), IoError>;

    /// Update the prompt configuration.
    ///
    /// The host uses this to render the prompt before the next input.
    fn write_prompt(&mut self, config: PromptConfig) -> Result<(), IoError>;

    /// Record a dispatched line or block in the line-edit history.
    fn record_history(&mut self, _entry: &str) -> Result<(), IoError> {
        Ok(())
    }

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<(), IoError> {
        Ok(())
    }
}
