// src/listeners/work_dir.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{CmdError, Result};
use crate::exec::ProcessExecutor;
use crate::listening::BeforeStart;

/// Runs the process in `path`, creating it (and missing parents) first.
#[derive(Debug, Clone)]
pub struct WorkDir {
    path: PathBuf,
}

impl WorkDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BeforeStart for WorkDir {
    fn before_start(&self, executor: &mut ProcessExecutor) -> Result<()> {
        executor.directory(&self.path);

        if !self.path.is_dir() {
            debug!(path = ?self.path, "creating working directory");
            fs::create_dir_all(&self.path).map_err(|source| CmdError::DirectoryCreation {
                path: self.path.clone(),
                source,
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_directory_and_sets_it() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("a").join("b");
        let mut executor = ProcessExecutor::new(vec!["true".to_string()]);

        WorkDir::new(&dir).before_start(&mut executor).unwrap();

        assert!(dir.is_dir());
        assert_eq!(executor.get_directory(), Some(dir.as_path()));
    }

    #[test]
    fn existing_directory_is_fine() {
        let tmp = tempfile::tempdir().unwrap();
        let mut executor = ProcessExecutor::new(vec!["true".to_string()]);

        WorkDir::new(tmp.path()).before_start(&mut executor).unwrap();

        assert_eq!(executor.get_directory(), Some(tmp.path()));
    }

    #[test]
    fn path_blocked_by_a_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("plain");
        fs::write(&file, b"x").unwrap();
        let mut executor = ProcessExecutor::new(vec!["true".to_string()]);

        let err = WorkDir::new(file.join("sub"))
            .before_start(&mut executor)
            .unwrap_err();

        assert!(matches!(err, CmdError::DirectoryCreation { .. }));
    }
}
