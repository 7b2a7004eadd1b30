// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{CommandConfig, RawCommandConfig};
use crate::errors::Result;

/// Load a command file and return the raw `RawCommandConfig`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] to
/// also check the definition.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawCommandConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawCommandConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a command file and validate it.
///
/// Checks for:
///   - a non-empty `command`,
///   - a non-blank `interpreter`,
///   - `clean_up` only together with `work_dir`,
///   - a parsable, non-zero `timeout`,
///   - non-empty redirect targets.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<CommandConfig> {
    let raw_config = load_from_path(&path)?;
    let config = CommandConfig::try_from(raw_config)?;
    Ok(config)
}
