// src/exec/launcher.rs

//! Argument vector construction and process start-up.
//!
//! Positional contract: `--json <repo> [<from> <to>]`. The repository path
//! always occupies the first positional slot; the revision pair, when
//! present, follows it. This mirrors the tool's own usage line
//! `transit <repo> [<old> <new>]`.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::debug;

use crate::types::ExecutionRequest;

/// Flag asking the tool for machine-readable output.
pub const JSON_FLAG: &str = "--json";

/// Build the tool's argument vector for a request.
pub fn build_args(request: &ExecutionRequest) -> Vec<String> {
    let mut args = vec![JSON_FLAG.to_string(), request.repo_path().to_string()];
    if let Some(pair) = request.revisions() {
        args.push(pair.from.clone());
        args.push(pair.to.clone());
    }
    args
}

/// Starts the external `transit` executable.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    executable: PathBuf,
}

impl ProcessLauncher {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Prepare the command without starting it.
    ///
    /// stdout and stderr are piped, stdin is closed, and the child is killed
    /// if its handle is dropped before being reaped.
    pub fn command(&self, request: &ExecutionRequest) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.args(build_args(request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Spawn the tool for `request`.
    pub fn spawn(&self, request: &ExecutionRequest) -> io::Result<Child> {
        debug!(
            executable = %self.executable.display(),
            args = ?build_args(request),
            "spawning transit"
        );
        self.command(request).spawn()
    }
}
