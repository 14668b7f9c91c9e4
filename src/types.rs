// src/types.rs

use serde::{Deserialize, Serialize};

use crate::errors::{Result, TransitError};

/// One line-range correspondence between an old and a new file revision,
/// exactly as emitted by `transit --json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffRecord {
    pub old_commit: String,
    pub new_commit: String,
    pub old_filename: String,
    pub new_filename: String,
    pub origin_line: u32,
    pub destination_line: u32,
    pub num_lines: u32,
}

/// Bounds of the commit range the tool should analyse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionPair {
    pub from: String,
    pub to: String,
}

impl RevisionPair {
    /// Build a pair only when both ends are present and not blank.
    ///
    /// A lone `from` or `to` is not meaningful to the tool, so it collapses to
    /// `None` just like supplying neither. Values are forwarded as given.
    pub fn from_parts(from: Option<&str>, to: Option<&str>) -> Option<Self> {
        let from = from.filter(|s| !s.trim().is_empty())?;
        let to = to.filter(|s| !s.trim().is_empty())?;
        Some(Self {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

/// A single call into the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    repo_path: String,
    revisions: Option<RevisionPair>,
}

impl ExecutionRequest {
    /// Validate and build a request.
    ///
    /// `repo_path` must be non-empty. See [`RevisionPair::from_parts`] for
    /// how partial revision pairs are handled.
    pub fn new(repo_path: &str, from: Option<&str>, to: Option<&str>) -> Result<Self> {
        if repo_path.trim().is_empty() {
            return Err(TransitError::InvalidRequest(
                "repository path must not be empty".to_string(),
            ));
        }

        Ok(Self {
            repo_path: repo_path.to_string(),
            revisions: RevisionPair::from_parts(from, to),
        })
    }

    pub fn repo_path(&self) -> &str {
        &self.repo_path
    }

    pub fn revisions(&self) -> Option<&RevisionPair> {
        self.revisions.as_ref()
    }
}
