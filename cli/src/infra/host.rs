//! `LinuxHost<R>`: the single adapter behind every host port.
//!
//! Each collaborator lives in its own module (`apt`, `git`, `venv`, `age`,
//! `systemd`, `ufw`, `fs`) as an `impl` block on this type. All processes go
//! through the injected `CommandRunner` so tests can record argv without
//! spawning anything.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, HostProbe};
use crate::domain::Layout;
use crate::infra::command_runner::{LONG_CMD_TIMEOUT, TokioCommandRunner, ensure_success};

const OS_RELEASE: &str = "/etc/os-release";

/// Production host adapter, generic over the process runner.
pub struct LinuxHost<R: CommandRunner> {
    pub(crate) runner: R,
    pub(crate) layout: Layout,
    pub(crate) os_release_path: PathBuf,
    pub(crate) long_timeout: Duration,
}

impl<R: CommandRunner> LinuxHost<R> {
    /// Adapter writing units into the layout's unit directory.
    pub fn new(runner: R, layout: &Layout) -> Self {
        Self {
            runner,
            layout: layout.clone(),
            os_release_path: PathBuf::from(OS_RELEASE),
            long_timeout: LONG_CMD_TIMEOUT,
        }
    }

    /// Read os-release from somewhere other than `/etc` (tests).
    #[must_use]
    pub fn with_os_release(mut self, path: impl Into<PathBuf>) -> Self {
        self.os_release_path = path.into();
        self
    }

    /// Borrow the underlying runner.
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run and require a zero exit, with the default timeout.
    pub(crate) async fn checked(&self, what: &str, program: &str, args: &[&str]) -> Result<Output> {
        let output = self.runner.run(program, args).await?;
        ensure_success(&output, what)?;
        Ok(output)
    }

    /// Run and require a zero exit, with the long timeout.
    pub(crate) async fn checked_long(
        &self,
        what: &str,
        program: &str,
        args: &[&str],
    ) -> Result<Output> {
        let output = self
            .runner
            .run_with_timeout(program, args, self.long_timeout)
            .await?;
        ensure_success(&output, what)?;
        Ok(output)
    }
}

impl LinuxHost<TokioCommandRunner> {
    /// Convenience constructor for production use.
    #[must_use]
    pub fn system(layout: &Layout) -> Self {
        Self::new(TokioCommandRunner::default(), layout)
    }
}

impl<R: CommandRunner> HostProbe for LinuxHost<R> {
    async fn effective_uid(&self) -> Result<u32> {
        let output = self.checked("id -u", "id", &["-u"]).await?;
        let raw = String::from_utf8_lossy(&output.stdout);
        raw.trim()
            .parse()
            .with_context(|| format!("parsing uid from {:?}", raw.trim()))
    }

    async fn os_release(&self) -> Result<String> {
        let path: &Path = &self.os_release_path;
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))
    }
}
