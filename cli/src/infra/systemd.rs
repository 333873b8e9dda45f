//! `ServiceSupervisor` via `systemctl` and `journalctl`.

use anyhow::Result;

use crate::application::ports::{CommandRunner, ServiceSupervisor};
use crate::domain::{ServiceUnit, UnitStatus};
use crate::infra::fs::write_atomic;
use crate::infra::host::LinuxHost;

/// Journal lines attached to an inactive unit's status.
const JOURNAL_LINES: &str = "30";

impl<R: CommandRunner> ServiceSupervisor for LinuxHost<R> {
    async fn install_unit(&self, unit: &ServiceUnit) -> Result<()> {
        let path = self.layout.unit_file(unit.name);
        tracing::debug!(unit = unit.name, path = %path.display(), "writing unit file");
        write_atomic(&path, unit.definition.as_bytes(), 0o644)
    }

    async fn reload_units(&self) -> Result<()> {
        self.checked("systemctl daemon-reload", "systemctl", &["daemon-reload"])
            .await?;
        Ok(())
    }

    async fn enable_unit(&self, name: &str) -> Result<()> {
        self.checked(
            &format!("systemctl enable {name}"),
            "systemctl",
            &["enable", name],
        )
        .await?;
        Ok(())
    }

    async fn restart_unit(&self, name: &str) -> Result<()> {
        self.checked(
            &format!("systemctl restart {name}"),
            "systemctl",
            &["restart", name],
        )
        .await?;
        Ok(())
    }

    async fn unit_status(&self, name: &str) -> Result<UnitStatus> {
        // `is-active`/`is-enabled` report through the exit code; a non-zero
        // exit is a state, not a failure.
        let active = self
            .runner
            .run("systemctl", &["is-active", "--quiet", name])
            .await?
            .status
            .success();
        let enabled = self
            .runner
            .run("systemctl", &["is-enabled", "--quiet", name])
            .await?
            .status
            .success();

        let recent_logs = if active {
            Vec::new()
        } else {
            let output = self
                .runner
                .run(
                    "journalctl",
                    &["-u", name, "-n", JOURNAL_LINES, "--no-pager", "--output=cat"],
                )
                .await?;
            String::from_utf8_lossy(&output.stdout)
                .lines()
                .map(str::to_string)
                .collect()
        };

        Ok(UnitStatus {
            name: name.to_string(),
            active,
            enabled,
            recent_logs,
        })
    }
}
