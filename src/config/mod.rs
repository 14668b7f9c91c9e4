// src/config/mod.rs

//! Configuration loading and validation for transit-bridge.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate and normalise it into runtime settings (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{config_root_dir, default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{ConfigFile, RawConfigFile, ToolSection, ToolSettings, DEFAULT_EXECUTABLE};
pub use validate::parse_duration;
