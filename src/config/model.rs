// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cmd::Cmd;
use crate::command::Command;
use crate::errors::Result;
use crate::exec::ProcessExecutor;
use crate::listeners::{CleanUp, RedirectToFile, WorkDir};
use crate::types::Stream;

/// A command definition as read from a TOML file.
///
/// ```toml
/// interpreter = "sh"
/// command = ["-c", "echo hello"]
/// work_dir = "target/run"
/// clean_up = true
/// read_output = true
/// timeout = "5s"
/// exit_values = [0]
///
/// [env]
/// GREETING = "hello"
///
/// [[redirect]]
/// stream = "stdout"
/// file = "out.log"
/// ```
///
/// Everything but `command` is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCommandConfig {
    /// Token prepended to `command`, e.g. `"sh"`.
    #[serde(default)]
    pub interpreter: Option<String>,

    /// Program and arguments (or interpreter arguments).
    #[serde(default)]
    pub command: Vec<String>,

    /// Working directory, created before start if missing.
    #[serde(default)]
    pub work_dir: Option<PathBuf>,

    /// Remove `work_dir` once the process stopped.
    #[serde(default)]
    pub clean_up: bool,

    /// Capture stdout/stderr in the result.
    #[serde(default)]
    pub read_output: bool,

    /// Duration string such as `"250ms"`, `"3s"`, `"1m"`.
    #[serde(default)]
    pub timeout: Option<String>,

    /// Accepted exit codes; any code is accepted when omitted.
    #[serde(default)]
    pub exit_values: Option<Vec<i32>>,

    /// Extra environment variables.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Output files, one `[[redirect]]` table each.
    #[serde(default)]
    pub redirect: Vec<RedirectConfig>,
}

/// `[[redirect]]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct RedirectConfig {
    /// `"stdout"` (default) or `"stderr"`.
    #[serde(default)]
    pub stream: Stream,

    /// Target file, relative paths resolve against `work_dir`.
    pub file: PathBuf,
}

/// A validated command definition.
///
/// Built from [`RawCommandConfig`] through `TryFrom`, which is what
/// [`load_and_validate`](super::load_and_validate) does.
#[derive(Debug, Clone)]
pub struct CommandConfig {
    interpreter: Option<String>,
    command: Vec<String>,
    work_dir: Option<PathBuf>,
    clean_up: bool,
    read_output: bool,
    timeout: Option<Duration>,
    exit_values: Option<Vec<i32>>,
    env: BTreeMap<String, String>,
    redirect: Vec<RedirectConfig>,
}

impl CommandConfig {
    pub(crate) fn new_unchecked(raw: RawCommandConfig, timeout: Option<Duration>) -> Self {
        Self {
            interpreter: raw.interpreter,
            command: raw.command,
            work_dir: raw.work_dir,
            clean_up: raw.clean_up,
            read_output: raw.read_output,
            timeout,
            exit_values: raw.exit_values,
            env: raw.env,
            redirect: raw.redirect,
        }
    }

    pub fn interpreter(&self) -> Option<&str> {
        self.interpreter.as_deref()
    }

    pub fn tokens(&self) -> &[String] {
        &self.command
    }

    pub fn work_dir(&self) -> Option<&Path> {
        self.work_dir.as_deref()
    }

    pub fn clean_up(&self) -> bool {
        self.clean_up
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn redirects(&self) -> &[RedirectConfig] {
        &self.redirect
    }

    /// Builder with the definition's listeners registered, in order: the
    /// settings action, `WorkDir`, each `RedirectToFile`, `CleanUp`.
    ///
    /// More listeners can be added before materializing.
    pub fn to_cmd(&self) -> Cmd {
        let read_output = self.read_output;
        let timeout = self.timeout;
        let exit_values = self.exit_values.clone();
        let env = self.env.clone();

        let mut cmd = Cmd::new().configuring(move |e: &mut ProcessExecutor| -> Result<()> {
            e.read_output(read_output);
            for (key, value) in &env {
                e.environment(key, value);
            }
            if let Some(timeout) = timeout {
                e.timeout(timeout);
            }
            if let Some(codes) = &exit_values {
                e.exit_values(codes.iter().copied());
            }
            Ok(())
        });

        if let Some(dir) = &self.work_dir {
            cmd = cmd.configuring(WorkDir::new(dir));
        }
        for redirect in &self.redirect {
            cmd = cmd.configuring(RedirectToFile::new(&redirect.file, redirect.stream));
        }
        if self.clean_up {
            cmd = cmd.configuring(CleanUp);
        }
        if let Some(interpreter) = &self.interpreter {
            cmd = cmd.interpreter(interpreter);
        }

        cmd
    }

    /// Materialize the definition.
    pub fn command(&self) -> Command {
        self.to_cmd().command(self.command.iter().cloned())
    }
}
