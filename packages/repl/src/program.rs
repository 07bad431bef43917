//! The accumulated program.
//!
//! Everything the user has entered so far lives here as parsed files. The
//! program only grows: statements are spliced into the first file with
//! [`File::merge_fragment`], injected files are appended whole, and the only
//! way to shrink it is an explicit [`Program::reset`].

use std::path::PathBuf;

use log::debug;

use lattice_lang::{discover, parse_file, File, FormatError, LoadError, ParseError, Project};

use crate::presentation::render_file;

/// Name given to text typed at the prompt.
pub const REPL_FILE: &str = "repl";

/// Where a reset takes the program's initial content from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetSource {
    Empty,
    /// Re-read the project rooted at this directory.
    Project(PathBuf),
}

#[derive(Debug, Clone, Default)]
pub struct Program {
    files: Vec<File>,
    module: Option<String>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_project(project: Project) -> Self {
        Self {
            files: project.files,
            module: Some(project.module),
        }
    }

    pub fn files(&self) -> &[File] {
        &self.files
    }

    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of declarations across all files.
    pub fn decl_count(&self) -> usize {
        self.files.iter().map(|f| f.decls.len()).sum()
    }

    /// Parse `text` and add its declarations.
    ///
    /// The first addition to an empty program becomes its first file; later
    /// additions are merged into that file. On a parse error the program is
    /// left untouched.
    pub fn append(&mut self, text: &str) -> Result<(), ParseError> {
        let parsed = parse_file(REPL_FILE, text)?;
        debug!("appending {} declaration(s)", parsed.decls.len());
        match self.files.first_mut() {
            Some(first) => first.merge_fragment(parsed),
            None => self.files.push(parsed),
        }
        Ok(())
    }

    /// Add already-parsed files after the existing ones.
    pub fn inject(&mut self, files: Vec<File>) {
        debug!("injecting {} file(s)", files.len());
        self.files.extend(files);
    }

    /// Replace the whole program.
    pub fn reset(&mut self, source: &ResetSource) -> Result<(), LoadError> {
        *self = match source {
            ResetSource::Empty => Program::new(),
            ResetSource::Project(dir) => Program::from_project(discover(dir)?),
        };
        debug!("reset program to {:?}", source);
        Ok(())
    }

    /// The program as formatted source, one section per file.
    pub fn source(&self) -> Result<String, FormatError> {
        let sections = self
            .files
            .iter()
            .map(render_file)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sections.join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn first_append_creates_file() {
        let mut program = Program::new();
        assert!(program.is_empty());
        program.append("a: 1").unwrap();
        assert_eq!(program.files().len(), 1);
        assert_eq!(program.files()[0].name, REPL_FILE);
        assert_eq!(program.source().unwrap(), "a: 1");
    }

    #[test]
    fn later_appends_merge_into_first_file() {
        let mut program = Program::new();
        program.append("a: 1").unwrap();
        program.append("import \"strings\"\nb: strings.ToUpper(\"x\")").unwrap();
        assert_eq!(program.files().len(), 1);
        assert_eq!(program.decl_count(), 2);
        assert_eq!(program.files()[0].imports.len(), 1);
    }

    #[test]
    fn failed_first_append_leaves_program_empty() {
        let mut program = Program::new();
        assert!(program.append("a: (").is_err());
        assert!(program.is_empty());
    }

    #[test]
    fn failed_append_leaves_program_unchanged() {
        let mut program = Program::new();
        program.append("a: 1").unwrap();
        let before = program.source().unwrap();
        assert!(program.append("b: }").is_err());
        assert_eq!(program.source().unwrap(), before);
    }

    #[test]
    fn reset_to_empty() {
        let mut program = Program::new();
        program.append("a: 1").unwrap();
        program.reset(&ResetSource::Empty).unwrap();
        assert!(program.is_empty());
        assert_eq!(program.module(), None);
    }

    #[test]
    fn reset_to_project_reloads_files() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("lattice.mod")).unwrap();
        std::fs::write(
            tmp.path().join("lattice.mod/module.lat"),
            "module: \"app\"",
        )
        .unwrap();
        std::fs::write(tmp.path().join("a.lat"), "a: 1").unwrap();

        let mut program = Program::new();
        program.append("z: 0").unwrap();
        program
            .reset(&ResetSource::Project(tmp.path().to_path_buf()))
            .unwrap();
        assert_eq!(program.module(), Some("app"));
        assert_eq!(program.source().unwrap(), "a: 1");
    }
}
