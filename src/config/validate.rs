// src/config/validate.rs

use std::path::PathBuf;
use std::time::Duration;

use crate::config::model::{ConfigFile, RawConfigFile, ToolSettings};
use crate::errors::{Result, TransitError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = TransitError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let tool = validate_tool_section(&raw)?;
        Ok(ConfigFile::new_unchecked(tool))
    }
}

fn validate_tool_section(cfg: &RawConfigFile) -> Result<ToolSettings> {
    let executable = cfg.tool.executable.trim();
    if executable.is_empty() {
        return Err(TransitError::ConfigError(
            "[tool].executable must not be empty".to_string(),
        ));
    }

    let timeout = match cfg.tool.timeout.as_deref() {
        None => None,
        Some(raw) => {
            let dur = parse_duration(raw).map_err(|e| {
                TransitError::ConfigError(format!("[tool].timeout is invalid: {e}"))
            })?;
            if dur.is_zero() {
                return Err(TransitError::ConfigError(
                    "[tool].timeout must be greater than zero".to_string(),
                ));
            }
            Some(dur)
        }
    };

    Ok(ToolSettings {
        executable: PathBuf::from(executable),
        timeout,
    })
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let split_at = s
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;
    let (num_part, unit) = s.split_at(split_at);

    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => scaled_secs(value, 60),
        "h" => scaled_secs(value, 60 * 60),
        other => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            other
        )),
    }
}

fn scaled_secs(value: u64, per_unit: u64) -> std::result::Result<Duration, String> {
    value
        .checked_mul(per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration too large: {value} x {per_unit}s"))
}
