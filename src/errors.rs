// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! These cover everything *around* an invocation (config, request
//! validation, IO). Failures of the external tool itself are never errors;
//! they are reported as [`crate::exec::ExecutionOutcome::Failure`] values.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransitError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, TransitError>;
