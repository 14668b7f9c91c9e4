//! A stand-in for the real `transit` binary.
//!
//! The fake is a single shell script shared by every test in the process.
//! It takes its behaviour from the repository directory it is pointed at:
//! `<repo>/.fake-transit/` holds the stdout payload, stderr payload, exit
//! code and flags of one scenario, and the script records its argument
//! vector there. Writing the script once avoids exec'ing a file that
//! another test thread may still hold open for writing.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use tempfile::TempDir;

const SCENARIO_DIR: &str = ".fake-transit";

const SCRIPT: &str = r#"#!/bin/sh
scenario="$2/.fake-transit"
printf '%s\n' "$@" > "$scenario/args"
if [ -f "$scenario/hang" ]; then
    echo $$ > "$scenario/pid"
    exec sleep 600
fi
if [ -f "$scenario/stderr_first" ]; then
    cat "$scenario/stderr" >&2
    cat "$scenario/stdout"
else
    cat "$scenario/stdout"
    cat "$scenario/stderr" >&2
fi
exit "$(cat "$scenario/exit_code")"
"#;

static TOOL: OnceLock<(TempDir, PathBuf)> = OnceLock::new();

/// Path of the fake `transit` executable.
pub fn fake_transit_executable() -> &'static Path {
    let (_dir, path) = TOOL.get_or_init(|| {
        let dir = tempfile::Builder::new()
            .prefix("fake-transit-bin")
            .tempdir()
            .expect("creating fake transit dir");
        let path = dir.path().join("transit");
        fs::write(&path, SCRIPT).expect("writing fake transit script");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("making fake transit executable");
        (dir, path)
    });
    path
}

/// A throwaway "repository" carrying one scripted tool run.
pub struct Scenario {
    repo: TempDir,
}

impl Scenario {
    pub fn builder() -> ScenarioBuilder {
        ScenarioBuilder::default()
    }

    /// Repository path to put in the request.
    pub fn repo_path(&self) -> String {
        self.repo.path().to_string_lossy().into_owned()
    }

    /// Arguments the fake received on its last run (without argv[0]).
    pub fn recorded_args(&self) -> Result<Vec<String>> {
        let path = self.repo.path().join(SCENARIO_DIR).join("args");
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("reading recorded args at {:?}", path))?;
        Ok(contents.lines().map(str::to_string).collect())
    }

    /// Pid of a hanging run, once the fake has started.
    ///
    /// `exec` keeps the pid, so this is the process that sleeps.
    pub fn recorded_pid(&self) -> Option<u32> {
        let path = self.repo.path().join(SCENARIO_DIR).join("pid");
        fs::read_to_string(path).ok()?.trim().parse().ok()
    }
}

/// Whether `pid` still names a process (zombies included).
pub fn process_exists(pid: u32) -> bool {
    Command::new("kill")
        .arg("-0")
        .arg(pid.to_string())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Builder for [`Scenario`].
#[derive(Debug, Clone, Default)]
pub struct ScenarioBuilder {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    exit_code: i32,
    stderr_first: bool,
    hang: bool,
}

impl ScenarioBuilder {
    pub fn stdout(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.stdout = data.into();
        self
    }

    pub fn stderr(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.stderr = data.into();
        self
    }

    pub fn exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    /// Write stderr before stdout.
    pub fn stderr_first(mut self) -> Self {
        self.stderr_first = true;
        self
    }

    /// Never exit (until killed).
    pub fn hang(mut self) -> Self {
        self.hang = true;
        self
    }

    pub fn build(self) -> Result<Scenario> {
        let repo = tempfile::Builder::new()
            .prefix("fake-repo")
            .tempdir()
            .context("creating fake repo dir")?;
        let dir = repo.path().join(SCENARIO_DIR);
        fs::create_dir_all(&dir).with_context(|| format!("creating {:?}", dir))?;

        fs::write(dir.join("stdout"), &self.stdout)?;
        fs::write(dir.join("stderr"), &self.stderr)?;
        fs::write(dir.join("exit_code"), self.exit_code.to_string())?;
        if self.stderr_first {
            fs::write(dir.join("stderr_first"), b"")?;
        }
        if self.hang {
            fs::write(dir.join("hang"), b"")?;
        }

        Ok(Scenario { repo })
    }
}
