// src/exec/started.rs

//! Handle for a command running in the background.

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::errors::{CmdError, Result};
use crate::exec::ProcessResult;
use crate::exec::runner::{self, Plan};

/// A process started by [`Command::start`](crate::Command::start).
///
/// The wait, the `AfterFinish` listeners and the `AfterStop` listeners run
/// in a Tokio task. [`wait`](Self::wait) resolves to the same result the
/// synchronous modes return.
///
/// Dropping the handle before the process finished cancels it: the process
/// is killed and the `AfterStop` listeners still run.
#[derive(Debug)]
pub struct StartedProcess {
    pid: Option<u32>,
    command: String,
    cancel: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<ProcessResult>>,
}

impl StartedProcess {
    pub(crate) fn spawn(plan: Arc<Plan>) -> Result<Self> {
        let launched = runner::launch(&plan)?;
        let pid = launched.pid();
        let timeout = launched.configured_timeout();
        let command = plan.display();

        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            runner::finish(launched, timeout, Some(cancel_rx), &plan.hooks.after_finish).await
        });

        Ok(Self {
            pid,
            command,
            cancel: Some(cancel_tx),
            handle,
        })
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Whether the background part of the execution has completed.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the process and its remaining listeners.
    pub async fn wait(mut self) -> Result<ProcessResult> {
        self.join().await
    }

    /// Kill the process if it is still running and wait for the `AfterStop`
    /// listeners.
    ///
    /// Resolves to [`CmdError::Cancelled`] unless the process had already
    /// finished, in which case its result is returned.
    pub async fn cancel(mut self) -> Result<ProcessResult> {
        if let Some(cancel) = self.cancel.take() {
            if cancel.send(()).is_err() {
                debug!(command = %self.command, "process already finished while cancelling");
            }
        }
        self.join().await
    }

    async fn join(&mut self) -> Result<ProcessResult> {
        match (&mut self.handle).await {
            Ok(result) => result,
            Err(e) => Err(CmdError::Aborted(format!("{}: {e}", self.command))),
        }
    }
}
