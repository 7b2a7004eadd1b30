// src/types.rs

use std::fmt;
use std::str::FromStr;
use serde::Deserialize;

/// Which output stream of the child a listener attaches to.
///
/// - `Output`: the process's stdout (default).
/// - `Error`: the process's stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Stream {
    #[serde(rename = "stdout")]
    Output,
    #[serde(rename = "stderr")]
    Error,
}

impl Default for Stream {
    fn default() -> Self {
        Stream::Output
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stream::Output => f.write_str("stdout"),
            Stream::Error => f.write_str("stderr"),
        }
    }
}

impl FromStr for Stream {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stdout" | "output" => Ok(Stream::Output),
            "stderr" | "error" => Ok(Stream::Error),
            other => Err(format!(
                "invalid stream: {other} (expected \"stdout\" or \"stderr\")"
            )),
        }
    }
}
