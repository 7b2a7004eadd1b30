// src/exec/mod.rs

//! Process execution layer.
//!
//! This is the executor primitive the hook sequence drives. Processes are
//! spawned with `tokio::process::Command`.
//!
//! - [`executor`] holds [`ProcessExecutor`], the per-execution configuration
//!   that configuring actions and `BeforeStart` listeners mutate.
//! - [`process`] defines the handles passed to listeners: [`RunningProcess`],
//!   [`ProcessResult`] and [`StoppedProcess`].
//! - `pump` copies child stdout/stderr into the capture buffer and any
//!   extra sinks.
//! - `runner` sequences the hook phases around spawn and wait, and
//!   guarantees the `AfterStop` chain runs once.
//! - [`started`] provides [`StartedProcess`], the handle returned by the
//!   asynchronous execution mode.

pub mod executor;
pub mod process;
pub(crate) mod pump;
pub(crate) mod runner;
pub mod started;

pub use executor::ProcessExecutor;
pub use process::{ProcessResult, RunningProcess, StoppedProcess};
pub use started::StartedProcess;
