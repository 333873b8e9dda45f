//! `hostprep status`: report the host's current state without changing it.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::status::collect_status;
use crate::commands::{ProvisionSettings, render_report, resolve_address};
use crate::infra::LinuxHost;

/// Entry point for `hostprep status`.
///
/// # Errors
///
/// Returns an error only if the report cannot be serialized.
pub async fn run(app: &AppContext, settings: &ProvisionSettings) -> Result<()> {
    let host = LinuxHost::system(&app.layout);
    let host_address = resolve_address(settings, host.runner()).await;
    let report = collect_status(&host, &app.layout, &host_address).await;
    render_report(app, &report)
}
