//! Finding and loading project files from disk.

use std::fs;
use std::path::{Path as FsPath, PathBuf};

use log::debug;

use crate::ast::File;
use crate::error::LoadError;
use crate::eval::build;
use crate::parser::parse_file;
use crate::value::Value;

/// Directory marking a project root.
pub const MODULE_DIR: &str = "lattice.mod";
/// Module description inside [`MODULE_DIR`].
pub const MODULE_FILE: &str = "module.lat";
pub const EXTENSION: &str = "lat";

/// A discovered project: its root directory, module name and parsed files.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub module: String,
    pub files: Vec<File>,
}

/// Load the project rooted at `dir`.
pub fn discover(dir: &FsPath) -> Result<Project, LoadError> {
    let module_dir = dir.join(MODULE_DIR);
    if !module_dir.is_dir() {
        return Err(LoadError::NotAProject {
            dir: dir.to_path_buf(),
        });
    }

    let module = match module_name(&module_dir.join(MODULE_FILE))? {
        Some(name) => name,
        None => dir
            .canonicalize()
            .ok()
            .as_deref()
            .unwrap_or(dir)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "main".to_string()),
    };
    let files = load_dir(dir)?;
    debug!(
        "discovered module {} with {} file(s) in {}",
        module,
        files.len(),
        dir.display()
    );
    Ok(Project {
        root: dir.to_path_buf(),
        module,
        files,
    })
}

/// Parse one source file. The file is named by its path.
pub fn load_file(path: &FsPath) -> Result<File, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file = parse_file(&path.display().to_string(), &text)?;
    debug!("loaded {} ({} declaration(s))", path.display(), file.decls.len());
    Ok(file)
}

/// Parse every `.lat` file directly inside `dir`, in file-name order.
pub fn load_dir(dir: &FsPath) -> Result<Vec<File>, LoadError> {
    let io_err = |source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == EXTENSION) {
            paths.push(path);
        }
    }
    paths.sort();
    paths.iter().map(|path| load_file(path)).collect()
}

/// The `module` field of the module file, if the file exists and sets one.
fn module_name(path: &FsPath) -> Result<Option<String>, LoadError> {
    if !path.is_file() {
        return Ok(None);
    }
    let file = load_file(path)?;
    let instance = build(&[file]).map_err(|source| LoadError::Module {
        path: path.to_path_buf(),
        source,
    })?;
    match instance.value().field("module") {
        Some(Value::String(name)) if !name.is_empty() => Ok(Some(name.clone())),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &FsPath, name: &str, text: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, text).unwrap();
    }

    #[test]
    fn plain_directory_is_not_a_project() {
        let tmp = TempDir::new().unwrap();
        let err = discover(tmp.path()).unwrap_err();
        assert!(matches!(err, LoadError::NotAProject { .. }));
    }

    #[test]
    fn module_name_from_module_file() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "lattice.mod/module.lat", "module: \"example.com/app\"");
        write(tmp.path(), "b.lat", "b: 2");
        write(tmp.path(), "a.lat", "a: 1");
        write(tmp.path(), "notes.txt", "ignored");

        let project = discover(tmp.path()).unwrap();
        assert_eq!(project.module, "example.com/app");
        let labels: Vec<Vec<&str>> = project.files.iter().map(File::field_labels).collect();
        assert_eq!(labels, vec![vec!["a"], vec!["b"]]);
    }

    #[test]
    fn module_name_falls_back_to_directory() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("myproj")).unwrap();
        fs::create_dir(tmp.path().join("myproj/lattice.mod")).unwrap();
        let project = discover(&tmp.path().join("myproj")).unwrap();
        assert_eq!(project.module, "myproj");
        assert!(project.files.is_empty());
    }

    #[test]
    fn parse_errors_name_the_file() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "lattice.mod/module.lat", "");
        write(tmp.path(), "bad.lat", "a: (");
        let err = discover(tmp.path()).unwrap_err();
        assert!(matches!(err, LoadError::Parse(_)));
        assert!(err.to_string().contains("bad.lat"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = load_file(&tmp.path().join("nope.lat")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
