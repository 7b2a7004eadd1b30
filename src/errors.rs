// src/errors.rs

//! Crate-wide error type and helpers.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::exec::ProcessResult;
use crate::listening::Phase;
use crate::types::Stream;

#[derive(Error, Debug)]
pub enum CmdError {
    #[error("command '{command}' timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("could not start command '{command}': {source}")]
    Start {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no command to run: the argument vector is empty")]
    EmptyCommand,

    #[error("waiting for command '{command}' failed: {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command '{command}' was cancelled")]
    Cancelled { command: String },

    #[error("command '{command}' exited with unexpected code {}", .result.exit_value())]
    InvalidExitValue {
        command: String,
        result: Box<ProcessResult>,
    },

    #[error("copying {stream} of command '{command}' into a redirect sink failed: {source}")]
    Redirect {
        command: String,
        stream: Stream,
        #[source]
        source: std::io::Error,
    },

    #[error("could not create working directory {path:?}: {source}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not remove working directory {path:?}: {source}")]
    DirectoryRemoval {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("output file {path:?} can not be created: {source}")]
    OutputFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("can not close output file {path:?}: {source}")]
    OutputClose {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{phase} listener failed: {source}")]
    Listener {
        phase: Phase,
        #[source]
        source: Box<CmdError>,
    },

    #[error("background execution aborted: {0}")]
    Aborted(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CmdError {
    /// Tag an error raised by a listener with the hook phase it came from.
    pub(crate) fn in_phase(self, phase: Phase) -> Self {
        match self {
            already @ CmdError::Listener { .. } => already,
            other => CmdError::Listener {
                phase,
                source: Box::new(other),
            },
        }
    }

    /// Hook phase the error was raised in, if it came from a listener.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            CmdError::Listener { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// The underlying error with any listener wrapping removed.
    pub fn root(&self) -> &CmdError {
        match self {
            CmdError::Listener { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.root(), CmdError::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, CmdError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_wrapping_is_not_nested() {
        let err = CmdError::EmptyCommand
            .in_phase(Phase::BeforeStart)
            .in_phase(Phase::AfterStop);

        assert_eq!(err.phase(), Some(Phase::BeforeStart));
        assert!(matches!(err.root(), CmdError::EmptyCommand));
    }

    #[test]
    fn timeout_is_detected_through_wrapping() {
        let err = CmdError::Timeout {
            command: "sleep 5".to_string(),
            timeout: Duration::from_millis(10),
        };
        assert!(err.is_timeout());
        assert!(err.phase().is_none());
        assert!(!CmdError::EmptyCommand.is_timeout());
    }
}
