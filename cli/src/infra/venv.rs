//! `RuntimeManager` via `python -m venv` and the environment's own `pip`.

use std::path::Path;

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, RuntimeManager};
use crate::domain::Interpreter;
use crate::infra::host::LinuxHost;

impl<R: CommandRunner> RuntimeManager for LinuxHost<R> {
    async fn create_runtime(&self, interpreter: Interpreter, env_dir: &Path) -> Result<()> {
        let env_dir = env_dir.to_str().context("venv path is not valid UTF-8")?;
        self.checked_long(
            "venv creation",
            interpreter.binary(),
            &["-m", "venv", env_dir],
        )
        .await?;
        Ok(())
    }

    async fn install_requirements(&self, env_dir: &Path, manifest: &Path) -> Result<()> {
        let pip = env_dir.join("bin").join("pip");
        let pip = pip.to_str().context("venv path is not valid UTF-8")?;
        let manifest = manifest
            .to_str()
            .context("requirements path is not valid UTF-8")?;

        self.checked_long(
            "pip upgrade",
            pip,
            &["install", "--quiet", "--upgrade", "pip"],
        )
        .await?;
        self.checked_long(
            "pip install -r requirements.txt",
            pip,
            &["install", "--quiet", "-r", manifest],
        )
        .await?;
        Ok(())
    }
}
