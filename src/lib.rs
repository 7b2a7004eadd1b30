// src/lib.rs

//! Declarative child-process invocations with ordered lifecycle listeners.
//!
//! A [`Cmd`] builder accumulates configuring actions, listeners for the four
//! hook roles and an optional interpreter, then materializes an immutable
//! [`Command`]. Every execution of a `Command` walks the same sequence:
//!
//! configuring → `BeforeStart` → spawn → `AfterStart` → wait →
//! `AfterFinish` (only on normal exit) → `AfterStop` (always, exactly once)
//!
//! ```no_run
//! use hookcmd::{Cmd, ProcessExecutor, Result};
//! use hookcmd::listeners::{CleanUp, RedirectToFile, WorkDir};
//!
//! # async fn demo() -> Result<()> {
//! let result = Cmd::new()
//!     .configuring(|e: &mut ProcessExecutor| -> Result<()> {
//!         e.read_output(true);
//!         Ok(())
//!     })
//!     .configuring(WorkDir::new("target/run"))
//!     .configuring(RedirectToFile::from_output_stream("out.log"))
//!     .configuring(CleanUp)
//!     .interpreter("sh")
//!     .command(["-c", "echo hello"])
//!     .execute_no_timeout()
//!     .await?;
//! assert_eq!(result.output_utf8(), "hello\n");
//! # Ok(())
//! # }
//! ```

pub mod cmd;
pub mod command;
pub mod config;
pub mod errors;
pub mod exec;
pub mod listeners;
pub mod listening;
pub mod logging;
pub mod types;

pub use cmd::Cmd;
pub use command::Command;
pub use errors::{CmdError, Result};
pub use exec::{ProcessExecutor, ProcessResult, RunningProcess, StartedProcess, StoppedProcess};
pub use listening::{AfterFinish, AfterStart, AfterStop, BeforeStart, Phase};
pub use types::Stream;
