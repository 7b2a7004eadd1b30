// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{CommandConfig, RawCommandConfig};
use crate::errors::{CmdError, Result};

impl TryFrom<RawCommandConfig> for CommandConfig {
    type Error = crate::errors::CmdError;

    fn try_from(raw: RawCommandConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let timeout = raw
            .timeout
            .as_deref()
            .map(parse_duration)
            .transpose()
            .map_err(|e| CmdError::ConfigError(format!("`timeout`: {e}")))?;
        Ok(CommandConfig::new_unchecked(raw, timeout))
    }
}

fn validate_raw_config(cfg: &RawCommandConfig) -> Result<()> {
    ensure_has_command(cfg)?;
    validate_interpreter(cfg)?;
    validate_work_dir(cfg)?;
    validate_redirects(cfg)?;
    validate_exit_values(cfg)?;
    Ok(())
}

fn ensure_has_command(cfg: &RawCommandConfig) -> Result<()> {
    if cfg.command.is_empty() {
        return Err(CmdError::ConfigError(
            "`command` must contain at least one token".to_string(),
        ));
    }
    if cfg.interpreter.is_none() && cfg.command[0].trim().is_empty() {
        return Err(CmdError::ConfigError(
            "`command` must start with a program name".to_string(),
        ));
    }
    Ok(())
}

fn validate_interpreter(cfg: &RawCommandConfig) -> Result<()> {
    if let Some(interpreter) = &cfg.interpreter {
        if interpreter.trim().is_empty() {
            return Err(CmdError::ConfigError(
                "`interpreter` must not be blank".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_work_dir(cfg: &RawCommandConfig) -> Result<()> {
    if let Some(dir) = &cfg.work_dir {
        if dir.as_os_str().is_empty() {
            return Err(CmdError::ConfigError(
                "`work_dir` must not be empty".to_string(),
            ));
        }
    }
    if cfg.clean_up && cfg.work_dir.is_none() {
        return Err(CmdError::ConfigError(
            "`clean_up = true` requires `work_dir`".to_string(),
        ));
    }
    Ok(())
}

fn validate_redirects(cfg: &RawCommandConfig) -> Result<()> {
    for (idx, redirect) in cfg.redirect.iter().enumerate() {
        if redirect.file.as_os_str().is_empty() {
            return Err(CmdError::ConfigError(format!(
                "`redirect[{idx}].file` must not be empty"
            )));
        }
    }
    Ok(())
}

fn validate_exit_values(cfg: &RawCommandConfig) -> Result<()> {
    if let Some(codes) = &cfg.exit_values {
        if codes.is_empty() {
            return Err(CmdError::ConfigError(
                "`exit_values` must list at least one code (omit it to accept any)".to_string(),
            ));
        }
    }
    Ok(())
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let seconds_per_unit = match unit.as_str() {
        "ms" => None,
        "s" => Some(1),
        "m" => Some(60),
        "h" => Some(60 * 60),
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };
    let duration = match seconds_per_unit {
        None => Duration::from_millis(value),
        Some(factor) => value
            .checked_mul(factor)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("duration '{}' is too large", s))?,
    };

    if duration.is_zero() {
        return Err("duration must be greater than zero".to_string());
    }
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_units() {
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration(" 3s "), Ok(Duration::from_secs(3)));
        assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
        assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    }

    #[test]
    fn rejects_malformed_durations() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("s").is_err());
        assert!(parse_duration("5d").is_err());
        assert!(parse_duration("0s").is_err());
    }

    #[test]
    fn rejects_durations_that_overflow() {
        let err = parse_duration("999999999999999999h").unwrap_err();
        assert!(err.contains("too large"), "unexpected message: {err}");
        assert_eq!(
            parse_duration("18446744073709551615s"),
            Ok(Duration::from_secs(u64::MAX))
        );
    }
}
