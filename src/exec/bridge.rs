// src/exec/bridge.rs

//! Async shell around the completion arbiter.
//!
//! One future owns everything belonging to an invocation: the child
//! process, its two pipes, the [`OutputAggregator`] and the
//! [`CompletionArbiter`]. It multiplexes stdout reads, stderr reads, the
//! exit status and the cancellation hook with `tokio::select!` and feeds
//! each observation to the arbiter until it resolves.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use crate::config::{ConfigFile, ToolSettings};
use crate::errors::Result;
use crate::exec::aggregator::OutputAggregator;
use crate::exec::arbiter::{CompletionArbiter, CompletionSignal, Disposition, Step, StreamKind};
use crate::exec::decoder;
use crate::exec::launcher::{build_args, ProcessLauncher};
use crate::exec::{ExecutionFailure, ExecutionOutcome, FailureKind};
use crate::types::ExecutionRequest;

const READ_CHUNK: usize = 8 * 1024;

/// Public entry point: runs `transit` for a request and resolves to one
/// [`ExecutionOutcome`].
///
/// A bridge holds only immutable settings. Every call gets its own process
/// and buffers, so concurrent calls on a shared bridge never interact.
#[derive(Debug, Clone)]
pub struct TransitBridge {
    launcher: ProcessLauncher,
    timeout: Option<Duration>,
}

impl TransitBridge {
    pub fn new(settings: ToolSettings) -> Self {
        Self {
            launcher: ProcessLauncher::new(settings.executable),
            timeout: settings.timeout,
        }
    }

    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self::new(cfg.tool.clone())
    }

    pub fn launcher(&self) -> &ProcessLauncher {
        &self.launcher
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run the tool for `request` on the current task.
    ///
    /// No retry is attempted; a failed invocation is reported as-is.
    pub async fn execute(&self, request: ExecutionRequest) -> ExecutionOutcome {
        // Held until the invocation finishes so the hook never fires.
        let (_cancel_tx, cancel_rx) = oneshot::channel::<()>();
        self.run(request, cancel_rx).await
    }

    /// Run the tool for `request` on a separate Tokio task.
    ///
    /// The returned handle can cancel the invocation; the child is then
    /// killed and reaped and the outcome is a `Cancelled` failure.
    pub fn spawn(&self, request: ExecutionRequest) -> ExecutionHandle {
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let bridge = self.clone();
        let join = tokio::spawn(async move { bridge.run(request, cancel_rx).await });
        ExecutionHandle {
            cancel: Some(cancel_tx),
            join,
        }
    }

    async fn run(
        &self,
        request: ExecutionRequest,
        cancel_rx: oneshot::Receiver<()>,
    ) -> ExecutionOutcome {
        info!(
            repo = %request.repo_path(),
            args = ?build_args(&request),
            executable = %self.launcher.executable().display(),
            "starting transit"
        );

        let mut arbiter = CompletionArbiter::new();
        let mut output = OutputAggregator::new();

        let disposition = match self.launcher.spawn(&request) {
            Ok(child) => {
                drive(child, &mut arbiter, &mut output, cancel_rx, self.timeout).await
            }
            Err(err) => {
                let message = format!(
                    "transit ({}) executable failed to run: {err}",
                    self.launcher.executable().display()
                );
                match arbiter.step(CompletionSignal::SpawnFailed(message.clone())) {
                    Step::Resolved(d) => d,
                    _ => Disposition::SpawnError { message },
                }
            }
        };

        let outcome = into_outcome(disposition, &output);
        match &outcome {
            ExecutionOutcome::Success(records) => {
                info!(repo = %request.repo_path(), records = records.len(), "transit ok");
            }
            ExecutionOutcome::Failure(f) => {
                warn!(
                    repo = %request.repo_path(),
                    kind = %f.kind,
                    exit_code = ?f.exit_code,
                    message = %f.message,
                    "transit execution failed"
                );
            }
        }
        outcome
    }
}

/// Handle to an invocation started with [`TransitBridge::spawn`].
#[derive(Debug)]
pub struct ExecutionHandle {
    cancel: Option<oneshot::Sender<()>>,
    join: JoinHandle<ExecutionOutcome>,
}

impl ExecutionHandle {
    /// Request cancellation. Returns `false` if the request could not be
    /// delivered (already cancelled, or the invocation already finished).
    pub fn cancel(&mut self) -> bool {
        match self.cancel.take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    /// Wait for the outcome.
    ///
    /// A panic inside the invocation task is resumed on the caller.
    pub async fn outcome(self) -> ExecutionOutcome {
        let ExecutionHandle { cancel, join } = self;
        let outcome = join_outcome(join.await);
        drop(cancel);
        outcome
    }
}

/// Map the join result of an invocation task to its outcome.
///
/// Panics are re-raised with their original payload; only a task torn
/// down by runtime shutdown becomes a `Cancelled` failure.
pub fn join_outcome(result: std::result::Result<ExecutionOutcome, JoinError>) -> ExecutionOutcome {
    match result {
        Ok(outcome) => outcome,
        Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
        Err(err) => ExecutionOutcome::Failure(ExecutionFailure::new(
            FailureKind::Cancelled,
            format!("invocation task was cancelled: {err}"),
        )),
    }
}

/// Caller-facing operation used by the web layer.
///
/// Fails only if the request itself is invalid (empty `repo_path`); every
/// problem with the tool is reported inside the outcome.
pub async fn execute_transit(
    bridge: &TransitBridge,
    repo_path: &str,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<ExecutionOutcome> {
    let request = ExecutionRequest::new(repo_path, from, to)?;
    Ok(bridge.execute(request).await)
}

/// Collect output and status of a running child until the arbiter resolves,
/// then make sure the child is reaped.
async fn drive(
    mut child: Child,
    arbiter: &mut CompletionArbiter,
    output: &mut OutputAggregator,
    mut cancel_rx: oneshot::Receiver<()>,
    timeout: Option<Duration>,
) -> Disposition {
    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();
    let mut out_buf = vec![0u8; READ_CHUNK];
    let mut err_buf = vec![0u8; READ_CHUNK];
    let mut cancel_armed = true;

    let deadline = async {
        match timeout {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    // A missing pipe counts as an already-closed stream.
    if stdout.is_none() {
        arbiter.step(CompletionSignal::StreamClosed(StreamKind::Stdout));
    }
    if stderr.is_none() {
        arbiter.step(CompletionSignal::StreamClosed(StreamKind::Stderr));
    }

    let disposition = loop {
        let signal = tokio::select! {
            res = read_chunk(&mut stdout, &mut out_buf), if stdout.is_some() => match res {
                Ok(0) => {
                    stdout = None;
                    CompletionSignal::StreamClosed(StreamKind::Stdout)
                }
                Ok(n) => {
                    debug!(bytes = n, "stdout chunk");
                    output.push_stdout(&out_buf[..n]);
                    continue;
                }
                Err(e) => {
                    warn!(error = %e, "reading transit stdout failed; abandoning stream");
                    stdout = None;
                    CompletionSignal::StreamClosed(StreamKind::Stdout)
                }
            },

            res = read_chunk(&mut stderr, &mut err_buf), if stderr.is_some() => match res {
                Ok(0) => {
                    stderr = None;
                    CompletionSignal::StreamClosed(StreamKind::Stderr)
                }
                Ok(n) => {
                    debug!(bytes = n, "stderr chunk");
                    output.push_stderr(&err_buf[..n]);
                    continue;
                }
                Err(e) => {
                    warn!(error = %e, "reading transit stderr failed; abandoning stream");
                    stderr = None;
                    CompletionSignal::StreamClosed(StreamKind::Stderr)
                }
            },

            status = child.wait(), if !arbiter.has_exited() => match status {
                Ok(status) => {
                    info!(exit_code = ?status.code(), success = status.success(), "transit process exited");
                    CompletionSignal::Exited(status.code())
                }
                Err(e) => {
                    warn!(error = %e, "waiting for transit process failed");
                    CompletionSignal::Exited(None)
                }
            },

            cancel = &mut cancel_rx, if cancel_armed => {
                cancel_armed = false;
                match cancel {
                    Ok(()) => CompletionSignal::Cancelled("cancellation requested".to_string()),
                    Err(_) => {
                        debug!("cancel channel closed without explicit cancellation");
                        continue;
                    }
                }
            },

            _ = &mut deadline => {
                let limit = timeout.unwrap_or_default();
                CompletionSignal::Cancelled(format!("timed out after {limit:?}"))
            },
        };

        match arbiter.step(signal) {
            Step::Resolved(disposition) => break disposition,
            Step::Pending | Step::Ignored => {}
        }
    };

    if !arbiter.has_exited() {
        info!("killing transit process before reporting outcome");
        if let Err(e) = child.kill().await {
            warn!(error = %e, "failed to kill transit process");
        }
    }

    disposition
}

async fn read_chunk<R>(stream: &mut Option<R>, buf: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    match stream {
        Some(s) => s.read(buf).await,
        None => std::future::pending().await,
    }
}

fn into_outcome(disposition: Disposition, output: &OutputAggregator) -> ExecutionOutcome {
    match disposition {
        Disposition::Succeeded => decoder::decode(output.stdout()),
        Disposition::NonZeroExit { code } => ExecutionOutcome::Failure(
            ExecutionFailure::new(FailureKind::NonZeroExit, output.stderr_text())
                .with_exit_code(code),
        ),
        Disposition::SpawnError { message } => {
            ExecutionOutcome::Failure(ExecutionFailure::new(FailureKind::SpawnError, message))
        }
        Disposition::Cancelled { reason } => {
            ExecutionOutcome::Failure(ExecutionFailure::new(FailureKind::Cancelled, reason))
        }
    }
}
