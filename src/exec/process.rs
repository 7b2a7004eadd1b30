// src/exec/process.rs

//! Process handles handed to listeners.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Notify;

/// A spawned process, as seen by `AfterStart` listeners.
#[derive(Debug, Clone)]
pub struct RunningProcess {
    pid: Option<u32>,
    command: Vec<String>,
    kill: Arc<Notify>,
}

impl RunningProcess {
    pub(crate) fn new(pid: Option<u32>, command: Vec<String>) -> Self {
        Self {
            pid,
            command,
            kill: Arc::new(Notify::new()),
        }
    }

    /// OS process id, if the platform reported one.
    pub fn id(&self) -> Option<u32> {
        self.pid
    }

    pub fn command_line(&self) -> &[String] {
        &self.command
    }

    /// Ask the runner to terminate the process.
    ///
    /// Returns immediately. The execution then completes as a normal finish
    /// with whatever exit code the killed process reports.
    pub fn kill(&self) {
        self.kill.notify_one();
    }

    pub(crate) fn kill_switch(&self) -> Arc<Notify> {
        Arc::clone(&self.kill)
    }
}

/// Outcome of a process that terminated on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    exit_code: i32,
    stdout: Option<Vec<u8>>,
    stderr: Option<Vec<u8>>,
}

impl ProcessResult {
    pub(crate) fn new(exit_code: i32, stdout: Option<Vec<u8>>, stderr: Option<Vec<u8>>) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
        }
    }

    /// Exit code; `-1` when the process was ended by a signal.
    pub fn exit_value(&self) -> i32 {
        self.exit_code
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Whether stdout/stderr were captured for this execution.
    pub fn has_output(&self) -> bool {
        self.stdout.is_some()
    }

    /// Captured stdout bytes; empty unless output capture was enabled.
    pub fn output(&self) -> &[u8] {
        self.stdout.as_deref().unwrap_or_default()
    }

    pub fn output_utf8(&self) -> String {
        String::from_utf8_lossy(self.output()).into_owned()
    }

    /// Captured stderr bytes; empty unless output capture was enabled.
    pub fn error_output(&self) -> &[u8] {
        self.stderr.as_deref().unwrap_or_default()
    }

    pub fn error_output_utf8(&self) -> String {
        String::from_utf8_lossy(self.error_output()).into_owned()
    }
}

/// A process after its execution ended, however it ended.
///
/// `AfterStop` listeners receive this even when the process never started,
/// in which case [`id`](Self::id) is `None`.
#[derive(Debug, Clone)]
pub struct StoppedProcess {
    pid: Option<u32>,
    started: bool,
    exit_code: Option<i32>,
    directory: Option<PathBuf>,
    command: Vec<String>,
}

impl StoppedProcess {
    pub(crate) fn unstarted(command: Vec<String>, directory: Option<PathBuf>) -> Self {
        Self {
            pid: None,
            started: false,
            exit_code: None,
            directory,
            command,
        }
    }

    pub(crate) fn mark_started(&mut self, pid: Option<u32>) {
        self.started = true;
        self.pid = pid;
    }

    pub(crate) fn record_exit(&mut self, exit_code: i32) {
        self.exit_code = Some(exit_code);
    }

    pub fn id(&self) -> Option<u32> {
        self.pid
    }

    pub fn has_started(&self) -> bool {
        self.started
    }

    /// Exit code if the process terminated on its own; `None` after a
    /// timeout, cancellation or start failure.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Working directory the execution was configured with.
    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    pub fn command_line(&self) -> &[String] {
        &self.command
    }
}
