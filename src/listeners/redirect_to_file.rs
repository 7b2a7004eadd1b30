// src/listeners/redirect_to_file.rs

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::errors::{CmdError, Result};
use crate::exec::{ProcessExecutor, StoppedProcess};
use crate::listening::{AfterStop, BeforeStart};
use crate::types::Stream;

/// Saves stdout (or stderr) into a file, even if the process stops
/// unexpectedly.
///
/// Before start it turns on output capture, opens the file and registers a
/// per-execution `AfterStop` companion that closes it. Relative paths are
/// resolved against the execution's working directory, so register this
/// after [`WorkDir`](super::WorkDir). The file is created if missing and is
/// neither truncated nor appended to: each execution writes from offset 0.
#[derive(Debug, Clone)]
pub struct RedirectToFile {
    path: PathBuf,
    stream: Stream,
}

impl RedirectToFile {
    pub fn new(path: impl Into<PathBuf>, stream: Stream) -> Self {
        Self {
            path: path.into(),
            stream,
        }
    }

    pub fn from_output_stream(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Stream::Output)
    }

    pub fn from_error_stream(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Stream::Error)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stream(&self) -> Stream {
        self.stream
    }

    fn resolve(&self, work_dir: Option<&Path>) -> PathBuf {
        match work_dir {
            Some(dir) if self.path.is_relative() => dir.join(&self.path),
            _ => self.path.clone(),
        }
    }
}

impl BeforeStart for RedirectToFile {
    fn before_start(&self, executor: &mut ProcessExecutor) -> Result<()> {
        executor.read_output(true);

        let path = self.resolve(executor.get_directory());
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .open(&path)
            .map_err(|source| CmdError::OutputFile {
                path: path.clone(),
                source,
            })?;
        debug!(path = ?path, stream = ?self.stream, "redirecting output to file");

        let handle = FileHandle(Arc::new(Mutex::new(Some(file))));
        executor.redirect_also_to(self.stream, handle.clone());
        executor.add_after_stop(CloseFile { path, handle });
        Ok(())
    }
}

/// The open file of one execution, shared by the output pump and the
/// closing companion.
#[derive(Clone)]
struct FileHandle(Arc<Mutex<Option<File>>>);

impl FileHandle {
    fn take(&self) -> io::Result<Option<File>> {
        let mut guard = self
            .0
            .lock()
            .map_err(|_| io::Error::other("output file lock poisoned"))?;
        Ok(guard.take())
    }
}

impl Write for FileHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .0
            .lock()
            .map_err(|_| io::Error::other("output file lock poisoned"))?;
        match guard.as_mut() {
            Some(file) => file.write(buf),
            None => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "output file already closed",
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self
            .0
            .lock()
            .map_err(|_| io::Error::other("output file lock poisoned"))?;
        match guard.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

struct CloseFile {
    path: PathBuf,
    handle: FileHandle,
}

impl AfterStop for CloseFile {
    fn after_stop(&self, _process: &StoppedProcess) -> Result<()> {
        let closed = self.handle.take().and_then(|file| match file {
            Some(mut file) => {
                file.flush()?;
                file.sync_all()
            }
            None => Ok(()),
        });

        closed.map_err(|source| CmdError::OutputClose {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = ?self.path, "closed output file");
        Ok(())
    }
}
