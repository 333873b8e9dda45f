//! `SourceFetcher` via `git`.

use std::path::Path;

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, SourceFetcher};
use crate::domain::SourceSpec;
use crate::infra::host::LinuxHost;

impl<R: CommandRunner> SourceFetcher for LinuxHost<R> {
    async fn clone_source(&self, source: &SourceSpec, dest: &Path) -> Result<()> {
        let dest = dest.to_str().context("install path is not valid UTF-8")?;
        self.checked_long(
            "git clone",
            "git",
            &[
                "clone",
                "--branch",
                &source.branch,
                "--single-branch",
                &source.url,
                dest,
            ],
        )
        .await?;
        Ok(())
    }

    async fn update_source(&self, source: &SourceSpec, dest: &Path) -> Result<()> {
        let dest = dest.to_str().context("install path is not valid UTF-8")?;
        self.checked_long(
            "git pull",
            "git",
            &["-C", dest, "pull", "--ff-only", "origin", &source.branch],
        )
        .await?;
        Ok(())
    }
}
