//! Host implementations for the REPL.
//!
//! The terminal host uses Reedline for interactive terminal I/O. The
//! in-memory host for tests lives in [`crate::io::test_host`].

pub mod terminal;

pub use terminal::TerminalHost;
