// src/exec/decoder.rs

//! Decoding of the tool's JSON output.

use tracing::{debug, warn};

use crate::exec::{ExecutionFailure, ExecutionOutcome, FailureKind};
use crate::types::DiffRecord;

/// Parse captured stdout as a JSON array of diff records, preserving order.
pub fn decode_records(stdout: &[u8]) -> Result<Vec<DiffRecord>, serde_json::Error> {
    serde_json::from_slice(stdout)
}

/// Decode stdout of a successful run into an outcome.
///
/// Never returns a partial list: any error yields `ParseError`.
pub fn decode(stdout: &[u8]) -> ExecutionOutcome {
    match decode_records(stdout) {
        Ok(records) => {
            debug!(count = records.len(), "decoded transit output");
            ExecutionOutcome::Success(records)
        }
        Err(err) => {
            warn!(error = %err, bytes = stdout.len(), "transit output is not a diff record array");
            ExecutionOutcome::Failure(ExecutionFailure::new(
                FailureKind::ParseError,
                err.to_string(),
            ))
        }
    }
}
