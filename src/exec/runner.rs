// src/exec/runner.rs

//! Hook sequencing around spawn and wait.
//!
//! One execution is split in two halves so the asynchronous mode can hand
//! the second one to a background task:
//!
//! - [`launch`]: configuring → `BeforeStart` → spawn → `AfterStart`
//! - [`finish`]: wait → `AfterFinish` → `AfterStop`
//!
//! The `AfterStop` chain is owned by a [`StopChain`] from the moment the
//! configuration is prepared, so every exit path (early error, timeout,
//! cancellation, even a dropped future) runs it exactly once. The chain also
//! owns the child and makes sure it is gone before any `AfterStop` listener
//! runs.

use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Child;
use tokio::sync::{Notify, oneshot};
use tokio::time::{Instant, sleep_until, timeout_at};
use tracing::{debug, info, warn};

use crate::errors::{CmdError, Result};
use crate::exec::pump::OutputPumps;
use crate::exec::{ProcessExecutor, ProcessResult, RunningProcess, StoppedProcess};
use crate::listening::{AfterFinish, AfterStart, AfterStop, BeforeStart, Phase};
use crate::types::Stream;

/// How often, and how long apart, a killed child is polled before the
/// `AfterStop` chain gives up waiting for it.
const REAP_POLLS: u32 = 50;
const REAP_INTERVAL: Duration = Duration::from_millis(5);

/// Listener registries of a materialized command, one per role.
#[derive(Clone, Default)]
pub(crate) struct Hooks {
    pub(crate) configuring: Vec<Arc<dyn BeforeStart>>,
    pub(crate) before_start: Vec<Arc<dyn BeforeStart>>,
    pub(crate) after_start: Vec<Arc<dyn AfterStart>>,
    pub(crate) after_finish: Vec<Arc<dyn AfterFinish>>,
    pub(crate) after_stop: Vec<Arc<dyn AfterStop>>,
}

/// Everything needed to run one command any number of times.
pub(crate) struct Plan {
    pub(crate) command_line: Vec<String>,
    pub(crate) hooks: Hooks,
}

impl Plan {
    pub(crate) fn display(&self) -> String {
        self.command_line.join(" ")
    }
}

/// A spawned process whose `AfterStart` listeners have run.
pub(crate) struct Launched {
    command: String,
    pumps: OutputPumps,
    running: RunningProcess,
    timeout: Option<Duration>,
    exit_values: Option<Vec<i32>>,
    stop: StopChain,
}

impl Launched {
    pub(crate) fn pid(&self) -> Option<u32> {
        self.running.id()
    }

    /// Timeout set on the executor configuration, if any.
    pub(crate) fn configured_timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Point in time the whole wait, output draining included, must end by.
#[derive(Debug, Clone, Copy)]
struct Deadline {
    at: Instant,
    limit: Duration,
}

impl Deadline {
    /// `None` when `limit` is too far out to be represented.
    fn after(limit: Duration) -> Option<Self> {
        let at = Instant::now().checked_add(limit)?;
        Some(Self { at, limit })
    }

    fn expired(&self, command: &str) -> CmdError {
        CmdError::Timeout {
            command: command.to_string(),
            timeout: self.limit,
        }
    }
}

/// Run the configuring actions and `BeforeStart` listeners, spawn the
/// process and run the `AfterStart` listeners.
///
/// On error the `AfterStop` chain has already run when this returns.
pub(crate) fn launch(plan: &Plan) -> Result<Launched> {
    let command = plan.display();
    let mut executor = ProcessExecutor::new(plan.command_line.clone());

    let prepared = prepare(&plan.hooks, &mut executor);

    let listeners = plan
        .hooks
        .after_stop
        .iter()
        .cloned()
        .chain(executor.take_after_stop())
        .collect();
    let stopped = StoppedProcess::unstarted(
        plan.command_line.clone(),
        executor.get_directory().map(|p| p.to_path_buf()),
    );
    let mut stop = StopChain::new(listeners, stopped);

    if let Err(err) = prepared {
        debug!(command = %command, error = %err, "preparation failed; process not started");
        return stop.finish(Err(err));
    }

    let (child, pumps) = match executor.spawn() {
        Ok(spawned) => spawned,
        Err(err) => return stop.finish(Err(err)),
    };

    let running = RunningProcess::new(child.id(), plan.command_line.clone());
    stop.attach(child);

    info!(command = %command, pid = ?running.id(), "process started");

    debug!(listeners = plan.hooks.after_start.len(), "running after-start listeners");
    for listener in &plan.hooks.after_start {
        if let Err(err) = listener.after_start(&running) {
            drop(pumps);
            return stop.finish(Err(err.in_phase(Phase::AfterStart)));
        }
    }

    Ok(Launched {
        command,
        pumps,
        running,
        timeout: executor.get_timeout(),
        exit_values: executor.take_exit_values(),
        stop,
    })
}

fn prepare(hooks: &Hooks, executor: &mut ProcessExecutor) -> Result<()> {
    debug!(actions = hooks.configuring.len(), "applying configuring actions");
    for action in &hooks.configuring {
        action
            .before_start(executor)
            .map_err(|e| e.in_phase(Phase::Configuring))?;
    }

    debug!(listeners = hooks.before_start.len(), "running before-start listeners");
    for listener in &hooks.before_start {
        listener
            .before_start(executor)
            .map_err(|e| e.in_phase(Phase::BeforeStart))?;
    }

    Ok(())
}

/// Wait for the launched process, then run `AfterFinish` (normal exit only)
/// and `AfterStop` (always).
///
/// `timeout` bounds the wait and the draining of captured output together;
/// `cancel` terminates the process when it fires or when its sender is
/// dropped.
pub(crate) async fn finish(
    launched: Launched,
    timeout: Option<Duration>,
    cancel: Option<oneshot::Receiver<()>>,
    after_finish: &[Arc<dyn AfterFinish>],
) -> Result<ProcessResult> {
    let Launched {
        command,
        mut pumps,
        running,
        exit_values,
        mut stop,
        ..
    } = launched;
    let deadline = timeout.and_then(Deadline::after);

    let Some(child) = stop.child.as_mut() else {
        let err = CmdError::Aborted(format!("{command}: process handle missing"));
        return stop.finish(Err(err));
    };
    let waited = wait_for_exit(&command, child, running.kill_switch(), deadline, cancel).await;

    let outcome = match waited {
        Ok(status) => {
            let exit_code = status.code().unwrap_or(-1);
            stop.process.record_exit(exit_code);
            info!(
                command = %command,
                pid = ?running.id(),
                exit_code,
                success = status.success(),
                "process exited"
            );
            let finished = Finished {
                command: &command,
                exit_code,
                deadline,
                exit_values,
            };
            finished.complete(&mut pumps, after_finish).await
        }
        Err(err) => Err(err),
    };

    drop(pumps);
    stop.finish(outcome)
}

/// A process that exited on its own, before its output was collected.
struct Finished<'a> {
    command: &'a str,
    exit_code: i32,
    deadline: Option<Deadline>,
    exit_values: Option<Vec<i32>>,
}

impl Finished<'_> {
    async fn complete(
        self,
        pumps: &mut OutputPumps,
        after_finish: &[Arc<dyn AfterFinish>],
    ) -> Result<ProcessResult> {
        let command = self.command;

        // Output pipes can outlive the child when it left a background
        // process behind, so the deadline covers draining too.
        let drained = match self.deadline {
            Some(deadline) => match timeout_at(deadline.at, pumps.collect()).await {
                Ok(drained) => drained,
                Err(_) => {
                    info!(
                        command = %command,
                        timeout = ?deadline.limit,
                        "timeout elapsed while draining output"
                    );
                    return Err(deadline.expired(command));
                }
            },
            None => pumps.collect().await,
        };
        let (stdout, stderr) = drained.map_err(|source| CmdError::Wait {
            command: command.to_string(),
            source,
        })?;

        let sink_error = stdout
            .sink_error
            .map(|e| (Stream::Output, e))
            .or_else(|| stderr.sink_error.map(|e| (Stream::Error, e)));
        let result = ProcessResult::new(self.exit_code, stdout.captured, stderr.captured);

        debug!(listeners = after_finish.len(), "running after-finish listeners");
        let mut errors: Vec<CmdError> = after_finish
            .iter()
            .filter_map(|l| l.after_finish(&result).err())
            .map(|e| e.in_phase(Phase::AfterFinish))
            .collect();
        if let Some((stream, source)) = sink_error {
            errors.push(CmdError::Redirect {
                command: command.to_string(),
                stream,
                source,
            });
        }
        first_of(errors)?;

        if let Some(accepted) = self.exit_values {
            if !accepted.contains(&self.exit_code) {
                return Err(CmdError::InvalidExitValue {
                    command: command.to_string(),
                    result: Box::new(result),
                });
            }
        }

        Ok(result)
    }
}

async fn wait_for_exit(
    command: &str,
    child: &mut Child,
    kill: Arc<Notify>,
    deadline: Option<Deadline>,
    cancel: Option<oneshot::Receiver<()>>,
) -> Result<ExitStatus> {
    let elapsed = async move {
        match deadline {
            Some(deadline) => sleep_until(deadline.at).await,
            None => std::future::pending::<()>().await,
        }
    };

    // A dropped sender counts as cancellation too.
    let cancelled = async move {
        match cancel {
            Some(rx) => {
                let _ = rx.await;
            }
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        status = wait_or_kill(command, child, &kill) => {
            status.map_err(|source| CmdError::Wait {
                command: command.to_string(),
                source,
            })
        }

        _ = elapsed => {
            let limit = deadline.map(|d| d.limit).unwrap_or_default();
            info!(command = %command, timeout = ?limit, "timeout elapsed; killing process");
            terminate(command, child).await;
            Err(CmdError::Timeout {
                command: command.to_string(),
                timeout: limit,
            })
        }

        _ = cancelled => {
            info!(command = %command, "cancellation requested; killing process");
            terminate(command, child).await;
            Err(CmdError::Cancelled {
                command: command.to_string(),
            })
        }
    }
}

/// Wait for the child, honoring kill requests from `AfterStart` listeners.
async fn wait_or_kill(
    command: &str,
    child: &mut Child,
    kill: &Notify,
) -> std::io::Result<ExitStatus> {
    tokio::select! {
        status = child.wait() => status,

        _ = kill.notified() => {
            debug!(command = %command, "kill requested by listener");
            if let Err(e) = child.start_kill() {
                warn!(command = %command, error = %e, "failed to kill child process");
            }
            child.wait().await
        }
    }
}

async fn terminate(command: &str, child: &mut Child) {
    if let Err(e) = child.kill().await {
        warn!(command = %command, error = %e, "failed to kill child process");
    }
}

/// Make sure the child is gone.
///
/// Normally it was already waited for. Otherwise it is killed and polled for
/// a bounded time; this also runs from `Drop`, so it cannot await.
fn reap(command: &str, child: &mut Child) {
    match child.try_wait() {
        Ok(Some(_)) => return,
        Ok(None) => {}
        Err(e) => {
            warn!(command = %command, error = %e, "could not query child process state");
            return;
        }
    }

    debug!(command = %command, "killing process before running after-stop listeners");
    if let Err(e) = child.start_kill() {
        warn!(command = %command, error = %e, "failed to kill child process");
        return;
    }
    for _ in 0..REAP_POLLS {
        match child.try_wait() {
            Ok(Some(_)) => return,
            Ok(None) => std::thread::sleep(REAP_INTERVAL),
            Err(e) => {
                warn!(command = %command, error = %e, "could not query child process state");
                return;
            }
        }
    }
    warn!(command = %command, "child process still running after kill");
}

/// The first error of a phase wins; the rest are logged.
fn first_of(errors: Vec<CmdError>) -> Result<()> {
    let mut errors = errors.into_iter();
    match errors.next() {
        None => Ok(()),
        Some(first) => {
            for other in errors {
                warn!(error = %other, "additional listener error suppressed");
            }
            Err(first)
        }
    }
}

/// The `AfterStop` listeners of one execution, plus the child once spawned.
///
/// [`finish`](StopChain::finish) runs them and merges their errors with the
/// outcome. If the chain is dropped before that, `Drop` runs them instead
/// and can only log failures. Either way a child still running is killed and
/// reaped first.
pub(crate) struct StopChain {
    listeners: Vec<Arc<dyn AfterStop>>,
    process: StoppedProcess,
    child: Option<Child>,
    fired: bool,
}

impl StopChain {
    fn new(listeners: Vec<Arc<dyn AfterStop>>, process: StoppedProcess) -> Self {
        Self {
            listeners,
            process,
            child: None,
            fired: false,
        }
    }

    fn attach(&mut self, child: Child) {
        self.process.mark_started(child.id());
        self.child = Some(child);
    }

    pub(crate) fn finish<T>(mut self, outcome: Result<T>) -> Result<T> {
        let errors = self.fire();
        match outcome {
            Err(err) => {
                for e in errors {
                    warn!(error = %e, "after-stop listener failed after an earlier error");
                }
                Err(err)
            }
            Ok(value) => first_of(errors).map(|()| value),
        }
    }

    fn fire(&mut self) -> Vec<CmdError> {
        self.fired = true;
        if let Some(child) = self.child.as_mut() {
            reap(&self.process.command_line().join(" "), child);
        }

        debug!(
            listeners = self.listeners.len(),
            started = self.process.has_started(),
            "running after-stop listeners"
        );
        self.listeners
            .iter()
            .filter_map(|l| l.after_stop(&self.process).err())
            .map(|e| e.in_phase(Phase::AfterStop))
            .collect()
    }
}

impl Drop for StopChain {
    fn drop(&mut self) {
        if self.fired {
            return;
        }
        warn!(
            command = %self.process.command_line().join(" "),
            "execution dropped before completion; running after-stop listeners"
        );
        for e in self.fire() {
            warn!(error = %e, "after-stop listener failed during drop");
        }
    }
}
