// src/command.rs

//! Immutable, executable command.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::Result;
use crate::exec::runner::{self, Hooks, Plan};
use crate::exec::{ProcessResult, StartedProcess};

/// A fully resolved invocation plus its listeners, produced by
/// [`Cmd::command`](crate::Cmd::command).
///
/// A `Command` never changes after materialization. Each execution builds a
/// fresh [`ProcessExecutor`](crate::ProcessExecutor) and invokes the
/// listeners afresh, so the same `Command` can be executed repeatedly, and
/// concurrently. Cloning is cheap.
#[derive(Clone)]
pub struct Command {
    plan: Arc<Plan>,
}

impl Command {
    pub(crate) fn new(command_line: Vec<String>, hooks: Hooks) -> Self {
        Self {
            plan: Arc::new(Plan {
                command_line,
                hooks,
            }),
        }
    }

    /// The resolved argument vector: `[interpreter?, tokens...]`.
    pub fn command_line(&self) -> &[String] {
        &self.plan.command_line
    }

    /// Run the command and wait at most `timeout` for it to exit.
    ///
    /// When the bound elapses the process is killed, the `AfterStop`
    /// listeners run and [`CmdError::Timeout`](crate::CmdError::Timeout) is
    /// returned.
    pub async fn execute(&self, timeout: Duration) -> Result<ProcessResult> {
        let launched = runner::launch(&self.plan)?;
        runner::finish(launched, Some(timeout), None, &self.plan.hooks.after_finish).await
    }

    /// Run the command and wait for it to exit, however long it takes.
    pub async fn execute_no_timeout(&self) -> Result<ProcessResult> {
        let launched = runner::launch(&self.plan)?;
        runner::finish(launched, None, None, &self.plan.hooks.after_finish).await
    }

    /// Start the command and return once its `AfterStart` listeners ran.
    ///
    /// Must be called from within a Tokio runtime. The wait is bounded only
    /// if a configuring action or listener set
    /// [`ProcessExecutor::timeout`](crate::ProcessExecutor::timeout).
    pub fn start(&self) -> Result<StartedProcess> {
        StartedProcess::spawn(Arc::clone(&self.plan))
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hooks = &self.plan.hooks;
        f.debug_struct("Command")
            .field("command_line", &self.plan.command_line)
            .field("configuring", &hooks.configuring.len())
            .field("before_start", &hooks.before_start.len())
            .field("after_start", &hooks.after_start.len())
            .field("after_finish", &hooks.after_finish.len())
            .field("after_stop", &hooks.after_stop.len())
            .finish()
    }
}
