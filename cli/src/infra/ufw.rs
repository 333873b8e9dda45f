//! `Firewall` via `ufw`.

use anyhow::Result;

use crate::application::ports::{CommandRunner, Firewall};
use crate::domain::firewall::FirewallRule;
use crate::infra::host::LinuxHost;

/// `ufw status` first line when the firewall is enforcing.
pub(crate) fn is_active_status(status: &str) -> bool {
    status
        .lines()
        .any(|l| l.trim().eq_ignore_ascii_case("status: active"))
}

/// `ufw allow` prints "Rule added" / "Rule updated" when it changed
/// something and "Skipping adding existing rule" otherwise.
pub(crate) fn rule_changed(allow_output: &str) -> bool {
    allow_output.lines().any(|l| {
        let l = l.trim();
        l.starts_with("Rule added") || l.starts_with("Rule updated")
    })
}

impl<R: CommandRunner> Firewall for LinuxHost<R> {
    async fn firewall_present(&self) -> Result<bool> {
        match self.runner.run("ufw", &["version"]).await {
            Ok(output) => Ok(output.status.success()),
            Err(e) => {
                tracing::debug!(error = %e, "ufw not runnable");
                Ok(false)
            }
        }
    }

    async fn firewall_active(&self) -> Result<bool> {
        let output = self.checked("ufw status", "ufw", &["status"]).await?;
        Ok(is_active_status(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn allow_rule(&self, rule: &FirewallRule) -> Result<bool> {
        let spec = rule.spec();
        let output = self
            .checked(
                &format!("ufw allow {spec}"),
                "ufw",
                &["allow", &spec, "comment", rule.label],
            )
            .await?;
        Ok(rule_changed(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn enable_firewall(&self) -> Result<()> {
        self.checked("ufw enable", "ufw", &["--force", "enable"])
            .await?;
        Ok(())
    }
}
