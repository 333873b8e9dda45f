//! `PackageManager` via `apt-get` / `apt-cache`.

use anyhow::Result;

use crate::application::ports::{CommandRunner, PackageManager};
use crate::infra::host::LinuxHost;

/// `apt-get` never prompts when invoked through this prefix.
const NONINTERACTIVE: [&str; 2] = ["env", "DEBIAN_FRONTEND=noninteractive"];

/// Whether `apt-cache policy` output offers an install candidate.
pub(crate) fn has_candidate(policy: &str) -> bool {
    policy
        .lines()
        .filter_map(|l| l.trim().strip_prefix("Candidate:"))
        .any(|c| {
            let c = c.trim();
            !c.is_empty() && c != "(none)"
        })
}

impl<R: CommandRunner> PackageManager for LinuxHost<R> {
    async fn is_package_available(&self, package: &str) -> Result<bool> {
        let output = self
            .checked("apt-cache policy", "apt-cache", &["policy", package])
            .await?;
        Ok(has_candidate(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn refresh_package_index(&self) -> Result<()> {
        let [env, frontend] = NONINTERACTIVE;
        self.checked_long("apt-get update", env, &[frontend, "apt-get", "update", "-q"])
            .await?;
        Ok(())
    }

    async fn install_packages(&self, packages: &[String]) -> Result<()> {
        let [env, frontend] = NONINTERACTIVE;
        let mut args = vec![frontend, "apt-get", "install", "-y", "-q"];
        args.extend(packages.iter().map(String::as_str));
        self.checked_long("apt-get install", env, &args).await?;
        Ok(())
    }

    async fn enable_system_service(&self, name: &str) -> Result<()> {
        self.checked(
            &format!("systemctl enable --now {name}"),
            "systemctl",
            &["enable", "--now", name],
        )
        .await?;
        Ok(())
    }
}
