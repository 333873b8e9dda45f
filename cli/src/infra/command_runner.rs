//! Infrastructure implementation of the `CommandRunner` port.
//!
//! `TokioCommandRunner` is the production implementation that uses tokio
//! for async process execution with guaranteed timeout and kill.

use std::process::{Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Child;

use crate::application::ports::CommandRunner;

/// Default timeout for short host queries (`id`, `systemctl is-active`, `ufw status`).
pub const DEFAULT_CMD_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for package installs, clones and dependency installs.
pub const LONG_CMD_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Production `CommandRunner`.
///
/// `tokio::time::timeout` around `.output().await` only drops the future; the
/// child keeps running. This uses `tokio::select!` with an explicit
/// `child.kill()` so a timed-out process is always terminated.
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl TokioCommandRunner {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for TokioCommandRunner {
    fn default() -> Self {
        Self::new(DEFAULT_CMD_TIMEOUT)
    }
}

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.run_with_timeout(program, args, self.timeout).await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output> {
        tracing::debug!(program, ?args, timeout_s = timeout.as_secs(), "exec");
        let child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;
        collect(child, program, timeout).await
    }

    async fn run_with_stdin(&self, program: &str, args: &[&str], input: &[u8]) -> Result<Output> {
        // argv is logged, stdin never is.
        tracing::debug!(program, ?args, stdin_bytes = input.len(), "exec with stdin");
        let mut child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input)
                .await
                .with_context(|| format!("writing stdin of {program}"))?;
            // Dropping the handle closes the pipe so the child sees EOF.
            drop(stdin);
        }
        collect(child, program, self.timeout).await
    }
}

/// Wait for `child` while draining both pipes; kill it on timeout.
async fn collect(mut child: Child, program: &str, timeout: Duration) -> Result<Output> {
    let mut stdout_handle = child.stdout.take();
    let mut stderr_handle = child.stderr.take();

    tokio::select! {
        result = async {
            let (status, stdout, stderr) = tokio::join!(
                child.wait(),
                async {
                    let mut buf = Vec::new();
                    if let Some(ref mut h) = stdout_handle {
                        let _ = h.read_to_end(&mut buf).await;
                    }
                    buf
                },
                async {
                    let mut buf = Vec::new();
                    if let Some(ref mut h) = stderr_handle {
                        let _ = h.read_to_end(&mut buf).await;
                    }
                    buf
                },
            );
            let status = status.with_context(|| format!("waiting for {program}"))?;
            tracing::debug!(program, code = ?status.code(), "exit");
            Ok(Output { status, stdout, stderr })
        } => result,
        () = tokio::time::sleep(timeout) => {
            let _ = child.kill().await;
            anyhow::bail!("{program} timed out after {}s", timeout.as_secs())
        }
    }
}

/// Fail with the command's stderr (or stdout when stderr is empty) unless it
/// exited successfully.
///
/// # Errors
///
/// Returns an error naming `what` and carrying the trimmed diagnostic output.
pub fn ensure_success(output: &Output, what: &str) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let detail = if stderr.trim().is_empty() {
        stdout.trim()
    } else {
        stderr.trim()
    };
    match output.status.code() {
        Some(code) => anyhow::bail!("{what} failed (exit {code}): {detail}"),
        None => anyhow::bail!("{what} was terminated by a signal: {detail}"),
    }
}
