// src/exec/executor.rs

//! Per-execution process configuration.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::{Child, Command};
use tracing::debug;

use crate::errors::{CmdError, Result};
use crate::exec::pump::{OutputPumps, Sink};
use crate::listening::AfterStop;
use crate::types::Stream;

/// Configuration of one process execution.
///
/// A fresh `ProcessExecutor` is built for every execution of a
/// [`Command`](crate::Command); configuring actions and `BeforeStart`
/// listeners receive it mutably before the process is spawned. Setters
/// return `&mut Self` so calls can be chained.
pub struct ProcessExecutor {
    command: Vec<String>,
    directory: Option<PathBuf>,
    environment: BTreeMap<String, String>,
    read_output: bool,
    output_sinks: Vec<Sink>,
    error_sinks: Vec<Sink>,
    timeout: Option<Duration>,
    exit_values: Option<Vec<i32>>,
    stop_listeners: Vec<Arc<dyn AfterStop>>,
}

impl ProcessExecutor {
    pub(crate) fn new(command: Vec<String>) -> Self {
        Self {
            command,
            directory: None,
            environment: BTreeMap::new(),
            read_output: false,
            output_sinks: Vec::new(),
            error_sinks: Vec::new(),
            timeout: None,
            exit_values: None,
            stop_listeners: Vec::new(),
        }
    }

    /// The resolved argument vector, interpreter first if one was set.
    pub fn command_line(&self) -> &[String] {
        &self.command
    }

    /// Set the working directory of the process.
    pub fn directory(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.directory = Some(dir.into());
        self
    }

    pub fn get_directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    /// Add or override one environment variable for the process.
    pub fn environment(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    pub fn get_environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }

    /// Capture stdout and stderr into the [`ProcessResult`](crate::ProcessResult).
    pub fn read_output(&mut self, read: bool) -> &mut Self {
        self.read_output = read;
        self
    }

    pub fn is_reading_output(&self) -> bool {
        self.read_output
    }

    /// Also copy the process's stdout into `sink`.
    ///
    /// Sinks add to, never replace, the other destinations of the stream.
    pub fn redirect_output_also_to(&mut self, sink: impl Write + Send + 'static) -> &mut Self {
        self.redirect_also_to(Stream::Output, sink)
    }

    /// Also copy the process's stderr into `sink`.
    pub fn redirect_error_also_to(&mut self, sink: impl Write + Send + 'static) -> &mut Self {
        self.redirect_also_to(Stream::Error, sink)
    }

    pub fn redirect_also_to(
        &mut self,
        stream: Stream,
        sink: impl Write + Send + 'static,
    ) -> &mut Self {
        match stream {
            Stream::Output => self.output_sinks.push(Box::new(sink)),
            Stream::Error => self.error_sinks.push(Box::new(sink)),
        }
        self
    }

    /// Bound the wait of the asynchronous mode ([`Command::start`](crate::Command::start)).
    ///
    /// The synchronous modes take their bound as an argument instead.
    pub fn timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Restrict the exit codes that count as success.
    ///
    /// By default every exit code is accepted.
    pub fn exit_values(&mut self, codes: impl IntoIterator<Item = i32>) -> &mut Self {
        self.exit_values = Some(codes.into_iter().collect());
        self
    }

    pub fn get_exit_values(&self) -> Option<&[i32]> {
        self.exit_values.as_deref()
    }

    /// Register an `AfterStop` listener for this execution only.
    ///
    /// It runs after the Command's own `AfterStop` listeners, in the order
    /// of these calls.
    pub fn add_after_stop(&mut self, listener: impl AfterStop + 'static) -> &mut Self {
        self.stop_listeners.push(Arc::new(listener));
        self
    }

    pub(crate) fn take_after_stop(&mut self) -> Vec<Arc<dyn AfterStop>> {
        std::mem::take(&mut self.stop_listeners)
    }

    pub(crate) fn take_exit_values(&mut self) -> Option<Vec<i32>> {
        self.exit_values.take()
    }

    /// Spawn the configured process and start pumping its output.
    pub(crate) fn spawn(&mut self) -> Result<(Child, OutputPumps)> {
        let (program, args) = self.command.split_first().ok_or(CmdError::EmptyCommand)?;

        let pipe_stdout = self.read_output || !self.output_sinks.is_empty();
        let pipe_stderr = self.read_output || !self.error_sinks.is_empty();

        let mut cmd = Command::new(program);
        cmd.args(args)
            .envs(&self.environment)
            .stdin(Stdio::null())
            .stdout(if pipe_stdout { Stdio::piped() } else { Stdio::null() })
            .stderr(if pipe_stderr { Stdio::piped() } else { Stdio::null() })
            .kill_on_drop(true);

        if let Some(dir) = &self.directory {
            cmd.current_dir(dir);
        }

        debug!(
            command = %self.command.join(" "),
            directory = ?self.directory,
            read_output = self.read_output,
            output_sinks = self.output_sinks.len(),
            error_sinks = self.error_sinks.len(),
            "spawning process"
        );

        let mut child = cmd.spawn().map_err(|source| CmdError::Start {
            command: self.command.join(" "),
            source,
        })?;

        let pumps = OutputPumps::start(
            child.stdout.take(),
            child.stderr.take(),
            self.read_output,
            std::mem::take(&mut self.output_sinks),
            std::mem::take(&mut self.error_sinks),
        );

        Ok((child, pumps))
    }
}

impl fmt::Debug for ProcessExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessExecutor")
            .field("command", &self.command)
            .field("directory", &self.directory)
            .field("environment", &self.environment)
            .field("read_output", &self.read_output)
            .field("output_sinks", &self.output_sinks.len())
            .field("error_sinks", &self.error_sinks.len())
            .field("timeout", &self.timeout)
            .field("exit_values", &self.exit_values)
            .field("stop_listeners", &self.stop_listeners.len())
            .finish()
    }
}
