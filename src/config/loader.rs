// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** validate or
/// resolve paths. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path, validate it, and anchor the
/// executable path at the config file's directory.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let raw_config = load_from_path(path)?;
    let mut config = ConfigFile::try_from(raw_config)?;
    config.tool = config.tool.resolve_against(&config_root_dir(path));
    Ok(config)
}

/// Load the config named on the command line, or fall back to the default
/// location.
///
/// - `Some(path)`: the file must exist.
/// - `None`: [`default_config_path`] is used if present; otherwise built-in
///   defaults apply, anchored at the current working directory.
pub fn load_or_default(explicit: Option<&Path>) -> Result<ConfigFile> {
    if let Some(path) = explicit {
        return load_and_validate(path);
    }

    let default_path = default_config_path();
    if default_path.is_file() {
        return load_and_validate(&default_path);
    }

    debug!(path = ?default_path, "no config file found; using built-in defaults");
    let mut config = ConfigFile::try_from(RawConfigFile::default())?;
    config.tool = config.tool.resolve_against(&config_root_dir(&default_path));
    Ok(config)
}

/// Helper to resolve a default config path: `Transit.toml` in the current
/// working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Transit.toml")
}

/// Directory that relative paths in a config file are resolved against.
///
/// - If the config path has a non-empty parent (e.g. "configs/Transit.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Transit.toml" (parent = ""),
///   we fall back to the current working directory.
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
