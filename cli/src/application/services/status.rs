//! Application service: read-only observation of the host.
//!
//! Used standalone by `hostprep status` and by the provisioning driver to
//! record the final state after its last step. Nothing here mutates the host.

use chrono::Utc;

use crate::application::ports::HostPlatform;
use crate::domain::report::fingerprint;
use crate::domain::units::service_units;
use crate::domain::{
    ArtifactState, ConvergenceReport, FirewallState, HostProfile, Layout, UnitStatus,
    WorkspacePresence,
};

/// Build a report from the current host state without running any step.
pub async fn collect_status(
    host: &impl HostPlatform,
    layout: &Layout,
    host_address: &str,
) -> ConvergenceReport {
    let mut report = ConvergenceReport::new(layout, host_address);
    if let (Ok(uid), Ok(os_release)) = (host.effective_uid().await, host.os_release().await) {
        report.host = Some(HostProfile::from_os_release(&os_release, uid));
    }
    report.workspace = Some(WorkspacePresence::observe(
        host.exists(&layout.install_root),
        host.exists(&layout.completeness_marker()),
    ));
    observe_into(host, layout, &mut report).await;
    report.finished_at = Some(Utc::now());
    report
}

/// Refresh artifact, service and firewall state on `report`.
///
/// Query failures degrade to "unknown" rather than erroring: the report must
/// always render. Firewall rules are only listed when the firewall step
/// applied them during this run.
pub async fn observe_into(host: &impl HostPlatform, layout: &Layout, report: &mut ConvergenceReport) {
    report.keypair = artifact(host, &layout.keypair_file(), false);
    report.config = artifact(host, &layout.config_file(), true);
    report.credential = artifact(host, &layout.credential_file(), true);

    if report.recipient.is_none() && report.keypair.present {
        report.recipient = host.recipient_of(&layout.keypair_file()).await.ok();
    }

    let mut services = Vec::with_capacity(2);
    for unit in service_units(layout) {
        let status = host
            .unit_status(unit.name)
            .await
            .unwrap_or_else(|e| {
                tracing::debug!(unit = unit.name, error = %e, "unit status query failed");
                UnitStatus::unknown(unit.name)
            });
        services.push(status);
    }
    report.services = services;

    if report.firewall.is_none() {
        let present = host.firewall_present().await.unwrap_or(false);
        let active = present && host.firewall_active().await.unwrap_or(false);
        report.firewall = Some(FirewallState {
            present,
            active,
            rules: Vec::new(),
        });
    }
}

/// Private key files are never fingerprinted.
fn artifact(host: &impl HostPlatform, path: &std::path::Path, hash: bool) -> ArtifactState {
    if !host.exists(path) {
        return ArtifactState::missing(path.to_path_buf());
    }
    ArtifactState {
        path: path.to_path_buf(),
        present: true,
        mode: host.mode(path).ok().flatten(),
        sha256: if hash {
            host.read(path).ok().map(|bytes| fingerprint(&bytes))
        } else {
            None
        },
    }
}
