// src/exec/arbiter.rs

//! Pure completion state machine.
//!
//! The arbiter consumes [`CompletionSignal`]s in whatever order the async
//! shell observes them and decides the terminal [`Disposition`] of an
//! invocation exactly once:
//!
//! ```text
//! Running ──spawn failed──────────────────────────────▶ SpawnError
//! Running ──exit(0)  + stdout closed + stderr closed ─▶ Succeeded
//! Running ──exit(≠0) + stdout closed + stderr closed ─▶ NonZeroExit
//! Running ──cancel───────────────────────────────────▶ Cancelled
//! ```
//!
//! An exit status is held back until both output streams have closed, so
//! the buffers consulted afterwards always contain all of the output. Any
//! signal arriving after the terminal transition is ignored.
//!
//! It has **no** Tokio types and does not perform any IO.

use tracing::debug;

/// Which output stream a signal refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

/// Events observed while a process runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionSignal {
    /// The process could not be started.
    SpawnFailed(String),
    /// One of the output streams reached EOF (or failed and was abandoned).
    StreamClosed(StreamKind),
    /// The process exited. `None` when it was terminated by a signal.
    Exited(Option<i32>),
    /// The caller (or the timeout) asked to stop waiting.
    Cancelled(String),
}

/// Terminal disposition of an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Succeeded,
    NonZeroExit { code: Option<i32> },
    SpawnError { message: String },
    Cancelled { reason: String },
}

/// Result of feeding one signal to the arbiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Still running; keep collecting signals.
    Pending,
    /// This signal produced the terminal transition.
    Resolved(Disposition),
    /// The arbiter had already resolved, or the signal was a duplicate.
    Ignored,
}

#[derive(Debug)]
pub struct CompletionArbiter {
    stdout_open: bool,
    stderr_open: bool,
    exit: Option<Option<i32>>,
    resolved: Option<Disposition>,
}

impl Default for CompletionArbiter {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionArbiter {
    pub fn new() -> Self {
        Self {
            stdout_open: true,
            stderr_open: true,
            exit: None,
            resolved: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    pub fn disposition(&self) -> Option<&Disposition> {
        self.resolved.as_ref()
    }

    /// Whether an exit status has been observed (acted on or not).
    pub fn has_exited(&self) -> bool {
        self.exit.is_some()
    }

    pub fn step(&mut self, signal: CompletionSignal) -> Step {
        if self.resolved.is_some() {
            debug!(?signal, "signal after terminal transition; ignoring");
            return Step::Ignored;
        }

        match signal {
            CompletionSignal::SpawnFailed(message) => {
                self.resolve(Disposition::SpawnError { message })
            }
            CompletionSignal::Cancelled(reason) => self.resolve(Disposition::Cancelled { reason }),
            CompletionSignal::StreamClosed(kind) => {
                let open = match kind {
                    StreamKind::Stdout => &mut self.stdout_open,
                    StreamKind::Stderr => &mut self.stderr_open,
                };
                if !*open {
                    debug!(?kind, "stream already closed; ignoring duplicate close");
                    return Step::Ignored;
                }
                *open = false;
                self.try_finish()
            }
            CompletionSignal::Exited(code) => {
                if self.exit.is_some() {
                    debug!(?code, "duplicate exit signal; ignoring");
                    return Step::Ignored;
                }
                self.exit = Some(code);
                self.try_finish()
            }
        }
    }

    fn try_finish(&mut self) -> Step {
        if self.stdout_open || self.stderr_open {
            return Step::Pending;
        }
        match self.exit {
            None => Step::Pending,
            Some(Some(0)) => self.resolve(Disposition::Succeeded),
            Some(code) => self.resolve(Disposition::NonZeroExit { code }),
        }
    }

    fn resolve(&mut self, disposition: Disposition) -> Step {
        self.resolved = Some(disposition.clone());
        Step::Resolved(disposition)
    }
}
