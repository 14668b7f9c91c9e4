// src/exec/aggregator.rs

//! Per-invocation output buffers.

/// Accumulates the stdout and stderr byte streams of one process.
///
/// Buffers only ever grow; chunks are appended in arrival order. Nothing is
/// decoded here.
#[derive(Debug, Default)]
pub struct OutputAggregator {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl OutputAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_stdout(&mut self, chunk: &[u8]) {
        self.stdout.extend_from_slice(chunk);
    }

    pub fn push_stderr(&mut self, chunk: &[u8]) {
        self.stderr.extend_from_slice(chunk);
    }

    pub fn stdout(&self) -> &[u8] {
        &self.stdout
    }

    pub fn stderr(&self) -> &[u8] {
        &self.stderr
    }

    /// Captured stderr as text, without the trailing newline(s) tools
    /// usually end their diagnostics with.
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim_end().to_string()
    }
}
