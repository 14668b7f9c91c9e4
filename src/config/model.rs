// src/config/model.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Where the transit binary lives relative to the config directory when
/// nothing else is configured.
pub const DEFAULT_EXECUTABLE: &str = "../target/transit";

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [tool]
/// executable = "../target/transit"
/// timeout = "30s"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    /// `[tool]` section describing the external analysis binary.
    #[serde(default)]
    pub tool: ToolSection,
}

/// `[tool]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolSection {
    /// Path to the transit executable.
    ///
    /// Relative paths containing a directory component are resolved against
    /// the directory of the config file. A bare name (e.g. `"transit"`) is
    /// looked up on `PATH` when spawning.
    #[serde(default = "default_executable")]
    pub executable: String,

    /// Optional duration string (e.g. `"30s"`, `"2m"`) after which a running
    /// invocation is cancelled. No timeout when absent.
    #[serde(default)]
    pub timeout: Option<String>,
}

fn default_executable() -> String {
    DEFAULT_EXECUTABLE.to_string()
}

impl Default for ToolSection {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            timeout: None,
        }
    }
}

/// Validated configuration.
///
/// Built from [`RawConfigFile`] via `TryFrom` (see `validate.rs`).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub tool: ToolSettings,
}

impl ConfigFile {
    /// Build a config without validation. Only used by `TryFrom`.
    pub(crate) fn new_unchecked(tool: ToolSettings) -> Self {
        Self { tool }
    }
}

/// Runtime settings for launching the transit tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSettings {
    pub executable: PathBuf,
    pub timeout: Option<Duration>,
}

impl ToolSettings {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Anchor a relative executable path at `base`.
    ///
    /// Absolute paths and bare program names are left untouched.
    pub fn resolve_against(mut self, base: &Path) -> Self {
        let is_bare_name = self.executable.components().count() == 1
            && self.executable.is_relative();
        if self.executable.is_relative() && !is_bare_name {
            self.executable = base.join(&self.executable);
        }
        self
    }
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self::new(DEFAULT_EXECUTABLE)
    }
}
