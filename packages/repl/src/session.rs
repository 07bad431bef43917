//! Session state: the program, its checkpoint history, and every operation
//! that reads or mutates them.

use std::path::Path as FsPath;

use log::{debug, log_enabled, trace, warn, Level};

use lattice_lang::{build, format, load, parse_expr, EvalError, Instance, Path, Value};

use crate::error::ReplError;
use crate::program::{Program, ResetSource};

/// Name given to expressions typed at the prompt.
const EXPR_NAME: &str = "expr";

/// An interactive session.
///
/// History holds one value per checkpoint. Entry 0 is the state the session
/// started in and always exists.
#[derive(Debug)]
pub struct Session {
    program: Program,
    history: Vec<Value>,
    reset_source: ResetSource,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// An empty freestyle session.
    pub fn new() -> Self {
        Self::with_program(Program::new(), ResetSource::Empty)
    }

    /// A session starting from `program`. Resets go back to `reset_source`.
    pub fn with_program(program: Program, reset_source: ResetSource) -> Self {
        let initial = match build(program.files()) {
            Ok(instance) => instance.into_value(),
            Err(err) => {
                warn!("initial program does not build: {}", err);
                Value::bottom(err.to_string())
            }
        };
        Self {
            program,
            history: vec![initial],
            reset_source,
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn history(&self) -> &[Value] {
        &self.history
    }

    pub fn module(&self) -> Option<&str> {
        self.program.module()
    }

    pub fn build(&self) -> Result<Instance, ReplError> {
        Ok(build(self.program.files())?)
    }

    /// The current value of the whole program.
    pub fn value(&self) -> Result<Value, ReplError> {
        Ok(self.build()?.into_value())
    }

    /// Evaluate `text` as an expression against the current program.
    /// The program is never modified.
    pub fn eval_expression(&self, text: &str) -> Result<Value, ReplError> {
        let expr = parse_expr(EXPR_NAME, text)?;
        let instance = self.build()?;
        Ok(instance.eval(&expr)?)
    }

    /// Add declarations to the program and checkpoint the result.
    ///
    /// If the text does not parse, or the program no longer builds with it,
    /// the program is left exactly as it was.
    pub fn add_statement(&mut self, text: &str) -> Result<(), ReplError> {
        let before = self.program.clone();
        self.program.append(text)?;
        if let Err(err) = self.checkpoint() {
            self.program = before;
            return Err(err);
        }
        Ok(())
    }

    /// The value at `path`, or `None` if no such field exists.
    pub fn lookup(&self, path: &str) -> Result<Option<Value>, ReplError> {
        let value = self.value()?;
        Ok(value.lookup(&Path::parse(path)).cloned())
    }

    /// Load a `.lat` file, or every `.lat` file in a directory, as additional
    /// files of the program. Returns how many files were added.
    pub fn inject(&mut self, path: &FsPath) -> Result<usize, ReplError> {
        let files = if path.is_dir() {
            load::load_dir(path)?
        } else {
            vec![load::load_file(path)?]
        };
        let count = files.len();

        let before = self.program.clone();
        self.program.inject(files);
        if let Err(err) = self.checkpoint() {
            self.program = before;
            return Err(err);
        }
        Ok(count)
    }

    /// Place the latest checkpoint at `path` in an otherwise empty program.
    pub fn save(&mut self, path: &str) -> Result<(), ReplError> {
        let latest = self.latest().clone();
        let filled = Value::empty_struct().fill(latest, &Path::parse(path));
        if let Some(message) = filled.err() {
            return Err(EvalError::Bottom(message.to_string()).into());
        }
        let text = format::value(&filled)?;

        let before = self.program.clone();
        let result = self.replace_program(&text).and_then(|()| self.checkpoint());
        if result.is_err() {
            self.program = before;
        }
        result
    }

    /// Make history entry `index` the program's sole content. Does not
    /// checkpoint.
    pub fn restore(&mut self, index: i64) -> Result<(), ReplError> {
        let value = usize::try_from(index)
            .ok()
            .and_then(|i| self.history.get(i))
            .cloned()
            .ok_or(ReplError::HistoryIndex {
                index,
                last: self.history.len() - 1,
            })?;
        let text = format::value(&value)?;

        let before = self.program.clone();
        let result = self
            .replace_program(&text)
            .and_then(|()| self.build().map(|_| ()));
        if result.is_err() {
            self.program = before;
        }
        result
    }

    /// Top-level labels of the current value. Best effort: a program that
    /// does not build, or whose value is not a struct, has no labels.
    pub fn field_labels(&self) -> Vec<String> {
        match self.value() {
            Ok(value) => value
                .labels()
                .map(|labels| labels.into_iter().map(str::to_string).collect())
                .unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }

    fn latest(&self) -> &Value {
        // History is created with one entry and only grows.
        &self.history[self.history.len() - 1]
    }

    fn replace_program(&mut self, text: &str) -> Result<(), ReplError> {
        self.program.reset(&self.reset_source)?;
        self.program.append(text)?;
        if log_enabled!(Level::Trace) {
            match self.program.source() {
                Ok(source) => trace!("program replaced:\n{}", source),
                Err(err) => trace!("program replaced; cannot format it: {}", err),
            }
        }
        Ok(())
    }

    fn checkpoint(&mut self) -> Result<(), ReplError> {
        let value = self.value()?;
        self.history.push(value);
        debug!("checkpoint {}", self.history.len() - 1);
        Ok(())
    }
}
