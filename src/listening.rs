// src/listening.rs

//! The four hook roles a listener can take part in.
//!
//! Each role is its own single-method trait, so a listener implements
//! exactly the subset it needs. Registration is explicit per role on
//! [`Cmd`](crate::Cmd): implementing a trait does not register the listener
//! for that role.
//!
//! Plain closures are listeners too:
//!
//! ```
//! use hookcmd::{Cmd, ProcessExecutor, Result, StoppedProcess};
//!
//! let cmd = Cmd::new()
//!     .configuring(|e: &mut ProcessExecutor| -> Result<()> {
//!         e.read_output(true);
//!         Ok(())
//!     })
//!     .listening_after_stop(|p: &StoppedProcess| -> Result<()> {
//!         println!("stopped, started = {}", p.has_started());
//!         Ok(())
//!     })
//!     .command(["echo", "hi"]);
//! # let _ = cmd;
//! ```

use std::fmt;

use crate::errors::Result;
use crate::exec::{ProcessExecutor, ProcessResult, RunningProcess, StoppedProcess};

/// Hook point within one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Configuring,
    BeforeStart,
    AfterStart,
    AfterFinish,
    AfterStop,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Configuring => "configuring",
            Phase::BeforeStart => "before-start",
            Phase::AfterStart => "after-start",
            Phase::AfterFinish => "after-finish",
            Phase::AfterStop => "after-stop",
        };
        f.write_str(name)
    }
}

/// Runs before the process is spawned.
///
/// May change the executor configuration (working directory, capture,
/// sinks) and register per-execution `AfterStop` companions through
/// [`ProcessExecutor::add_after_stop`]. An error aborts the rest of the
/// chain and the process is never spawned.
pub trait BeforeStart: Send + Sync {
    fn before_start(&self, executor: &mut ProcessExecutor) -> Result<()>;
}

/// Runs right after the process was spawned. Must not block for long.
pub trait AfterStart: Send + Sync {
    fn after_start(&self, process: &RunningProcess) -> Result<()>;
}

/// Runs once the process terminated on its own and its result is known.
pub trait AfterFinish: Send + Sync {
    fn after_finish(&self, result: &ProcessResult) -> Result<()>;
}

/// Runs exactly once per execution however it ended: normal exit, timeout,
/// cancellation, or a failure before the process could start.
///
/// Implementations must cope with a process that never started
/// ([`StoppedProcess::has_started`] is `false`).
pub trait AfterStop: Send + Sync {
    fn after_stop(&self, process: &StoppedProcess) -> Result<()>;
}

impl<F> BeforeStart for F
where
    F: Fn(&mut ProcessExecutor) -> Result<()> + Send + Sync,
{
    fn before_start(&self, executor: &mut ProcessExecutor) -> Result<()> {
        self(executor)
    }
}

impl<F> AfterStart for F
where
    F: Fn(&RunningProcess) -> Result<()> + Send + Sync,
{
    fn after_start(&self, process: &RunningProcess) -> Result<()> {
        self(process)
    }
}

impl<F> AfterFinish for F
where
    F: Fn(&ProcessResult) -> Result<()> + Send + Sync,
{
    fn after_finish(&self, result: &ProcessResult) -> Result<()> {
        self(result)
    }
}

impl<F> AfterStop for F
where
    F: Fn(&StoppedProcess) -> Result<()> + Send + Sync,
{
    fn after_stop(&self, process: &StoppedProcess) -> Result<()> {
        self(process)
    }
}
