// src/exec/mod.rs

//! Process execution layer.
//!
//! This module runs the external `transit` binary with
//! `tokio::process::Command` and turns whatever happens to that process into
//! exactly one [`ExecutionOutcome`].
//!
//! - [`launcher`] builds the argument vector and spawns the process.
//! - [`aggregator`] owns the stdout / stderr buffers of one invocation.
//! - [`arbiter`] is the pure completion state machine; it decides the
//!   terminal disposition once, from stream-closed / exit / spawn-error /
//!   cancel signals in any order.
//! - [`decoder`] parses captured stdout into [`DiffRecord`]s.
//! - [`bridge`] is the async shell that wires the above together and is the
//!   public entry point ([`TransitBridge`]).

pub mod aggregator;
pub mod arbiter;
pub mod bridge;
pub mod decoder;
pub mod launcher;

use std::fmt;

use thiserror::Error;

use crate::types::DiffRecord;

pub use aggregator::OutputAggregator;
pub use arbiter::{CompletionArbiter, CompletionSignal, Disposition, Step, StreamKind};
pub use bridge::{execute_transit, join_outcome, ExecutionHandle, TransitBridge};
pub use decoder::{decode, decode_records};
pub use launcher::{build_args, ProcessLauncher, JSON_FLAG};

/// Why an invocation did not produce records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The tool could not be started (missing binary, permissions, bad path).
    SpawnError,
    /// The tool ran and exited unsuccessfully.
    NonZeroExit,
    /// The tool exited 0 but stdout was not a JSON array of diff records.
    ParseError,
    /// The invocation was cancelled or hit the configured timeout.
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::SpawnError => "spawn error",
            FailureKind::NonZeroExit => "non-zero exit",
            FailureKind::ParseError => "parse error",
            FailureKind::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// A categorized failure of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ExecutionFailure {
    pub kind: FailureKind,
    pub message: String,
    /// Exit code for `NonZeroExit`; `None` when the process was killed by a
    /// signal or never produced a status.
    pub exit_code: Option<i32>,
}

impl ExecutionFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            exit_code: None,
        }
    }

    pub fn with_exit_code(mut self, code: Option<i32>) -> Self {
        self.exit_code = code;
        self
    }
}

/// Single resolved result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Success(Vec<DiffRecord>),
    Failure(ExecutionFailure),
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Success(_))
    }

    pub fn records(&self) -> Option<&[DiffRecord]> {
        match self {
            ExecutionOutcome::Success(records) => Some(records),
            ExecutionOutcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ExecutionFailure> {
        match self {
            ExecutionOutcome::Success(_) => None,
            ExecutionOutcome::Failure(f) => Some(f),
        }
    }

    pub fn into_result(self) -> Result<Vec<DiffRecord>, ExecutionFailure> {
        match self {
            ExecutionOutcome::Success(records) => Ok(records),
            ExecutionOutcome::Failure(f) => Err(f),
        }
    }
}
