// src/listeners/mod.rs

//! Stock listeners.
//!
//! - [`WorkDir`] provisions and sets the working directory.
//! - [`CleanUp`] removes the working directory once the process stopped.
//! - [`RedirectTo`] copies stdout or stderr into an arbitrary sink.
//! - [`RedirectToFile`] copies stdout or stderr into a file under the
//!   working directory and closes it when the process stopped.
//! - [`LineSink`] is a sink that hands complete lines to a callback.
//!
//! None of them keep per-execution state, so one instance can serve any
//! number of executions.

pub mod clean_up;
pub mod line_sink;
pub mod redirect_to;
pub mod redirect_to_file;
pub mod work_dir;

pub use clean_up::CleanUp;
pub use line_sink::LineSink;
pub use redirect_to::RedirectTo;
pub use redirect_to_file::RedirectToFile;
pub use work_dir::WorkDir;
