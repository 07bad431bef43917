//! Platform-independent REPL core.
//!
//! The loop owns the [`Session`] and talks to the user only through the
//! `IoHost` trait, so the same core drives the terminal and the in-memory
//! test host.

use log::debug;

use crate::commands::{self, Command, CommandResult};
use crate::input::{Dispatch, InputController};
use crate::io::{ExitReason, IoError, IoHost, Output, PromptConfig, Signal};
use crate::presentation;
use crate::session::Session;

/// The platform-independent REPL core.
pub struct ReplCore {
    session: Session,
    input: InputController,
}

impl ReplCore {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            input: InputController::new(),
        }
    }

    /// Run the loop until the user leaves or input ends.
    pub fn run(&mut self, io: &mut impl IoHost) -> Result<ExitReason, IoError> {
        self.write_banner(io)?;

        loop {
            self.update_prompt(io)?;
            io.wait_for_input()?;

            if let Some(signal) = io.read_signal()? {
                match signal {
                    Signal::Eof => return goodbye(io, ExitReason::Eof),
                    // Only the line being edited is lost.
                    Signal::Interrupt { partial: true } => continue,
                    Signal::Interrupt { partial: false } => {
                        return goodbye(io, ExitReason::Interrupt)
                    }
                }
            }

            let input = match io.read_input()? {
                Some(input) => input,
                None => continue,
            };

            let Some(entry) = self.input.feed(&input.line) else {
                continue;
            };
            io.record_history(&entry.text)?;

            match self.dispatch(entry.dispatch) {
                CommandResult::Ok { display: None } => {}
                CommandResult::Ok {
                    display: Some(text),
                } => io.write_output(Output::normal(text))?,
                CommandResult::Info(text) => io.write_output(Output::info(text))?,
                CommandResult::Error(msg) => io.write_output(Output::error(msg))?,
                CommandResult::Help => {
                    io.write_output(Output::normal(commands::format_help()))?
                }
                CommandResult::Exit => return goodbye(io, ExitReason::UserExit),
            }

            io.flush()?;
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn dispatch(&mut self, dispatch: Dispatch) -> CommandResult {
        match dispatch {
            Dispatch::Command(text) => {
                debug!("command: {}", text);
                match Command::parse(&text) {
                    Ok(command) => commands::execute(command, &mut self.session),
                    Err(err) => err.into(),
                }
            }
            Dispatch::Statement(text) => match self.session.add_statement(&text) {
                Ok(()) => CommandResult::ok_none(),
                Err(err) => err.into(),
            },
            Dispatch::Expression(text) => {
                let rendered = self
                    .session
                    .eval_expression(&text)
                    .and_then(|value| Ok(presentation::render(&value)?));
                match rendered {
                    Ok(text) => CommandResult::ok_display(text),
                    Err(err) => err.into(),
                }
            }
        }
    }

    fn write_banner(&self, io: &mut impl IoHost) -> Result<(), IoError> {
        io.write_output(Output::banner(BANNER))?;
        let mode = match self.session.module() {
            Some(module) => format!("(running in module {})", module),
            None => "(running in freestyle mode)".to_string(),
        };
        io.write_output(Output::info(mode))
    }

    fn update_prompt(&self, io: &mut impl IoHost) -> Result<(), IoError> {
        io.write_prompt(PromptConfig {
            continuation: self.input.is_accumulating(),
            module: self.session.module().map(str::to_string),
            labels: self.session.field_labels(),
        })
    }
}

impl Default for ReplCore {
    fn default() -> Self {
        Self::new(Session::new())
    }
}

fn goodbye(io: &mut impl IoHost, reason: ExitReason) -> Result<ExitReason, IoError> {
    io.write_output(Output::info("bye"))?;
    io.flush()?;
    Ok(reason)
}

const BANNER: &str = "Welcome to the Lattice REPL. Type :help for commands, :exit to quit.";
