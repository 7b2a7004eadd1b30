// src/listeners/clean_up.rs

use std::fs;
use std::io::ErrorKind;

use tracing::debug;

use crate::errors::{CmdError, Result};
use crate::exec::{ProcessExecutor, StoppedProcess};
use crate::listening::{AfterStop, BeforeStart};

/// Recursively removes the execution's working directory after the process
/// stopped.
///
/// As an `AfterStop` listener it runs at its place in the Command's
/// `AfterStop` list. Passed to `configuring` (or as a `BeforeStart`
/// listener) it instead appends itself to the execution's own `AfterStop`
/// chain, so it runs after the companions of listeners registered before it,
/// such as [`RedirectToFile`](super::RedirectToFile) closing its file.
///
/// Does nothing when no working directory was configured or when it is
/// already gone.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanUp;

impl BeforeStart for CleanUp {
    fn before_start(&self, executor: &mut ProcessExecutor) -> Result<()> {
        executor.add_after_stop(*self);
        Ok(())
    }
}

impl AfterStop for CleanUp {
    fn after_stop(&self, process: &StoppedProcess) -> Result<()> {
        let Some(dir) = process.directory() else {
            debug!("no working directory configured; nothing to clean up");
            return Ok(());
        };

        match fs::remove_dir_all(dir) {
            Ok(()) => {
                debug!(path = ?dir, "removed working directory");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CmdError::DirectoryRemoval {
                path: dir.to_path_buf(),
                source,
            }),
        }
    }
}
