//! Command implementations

pub mod provision;
pub mod status;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::CommandRunner;
use crate::domain::ConvergenceReport;
use crate::domain::workspace::{DEFAULT_BRANCH, DEFAULT_REPO_URL};
use crate::infra::address::{PUBLIC_IP_URL, detect_host_address};
use crate::output::{HumanRenderer, json};

/// Settings shared by every command, each overridable from the environment.
#[derive(Args, Debug, Clone)]
pub struct ProvisionSettings {
    /// API key substituted for `YOUR_HELIUS_API_KEY` in the configuration template
    #[arg(long, env = "HELIUS_API_KEY", global = true, hide_env_values = true)]
    pub helius_api_key: Option<String>,

    /// Address operators reach this host on [default: detected public address]
    #[arg(long, env = "SERVER_IP", global = true)]
    pub server_ip: Option<String>,

    /// Git repository holding the application source
    #[arg(long, env = "BOT_REPO_URL", global = true, default_value = DEFAULT_REPO_URL)]
    pub repo_url: String,

    /// Branch to check out and track
    #[arg(long, env = "BOT_BRANCH", global = true, default_value = DEFAULT_BRANCH)]
    pub branch: String,

    /// Echo service queried for the public address when no --server-ip is given
    #[arg(long, env = "HOSTPREP_PUBLIC_IP_URL", global = true, default_value = PUBLIC_IP_URL)]
    pub public_ip_url: String,
}

/// Explicit `--server-ip` wins; otherwise detect.
pub(crate) async fn resolve_address(
    settings: &ProvisionSettings,
    runner: &impl CommandRunner,
) -> String {
    match settings.server_ip.as_deref().map(str::trim) {
        Some(ip) if !ip.is_empty() => ip.to_string(),
        _ => detect_host_address(&settings.public_ip_url, runner).await,
    }
}

/// Print a report in the selected output mode.
pub(crate) fn render_report(app: &AppContext, report: &ConvergenceReport) -> Result<()> {
    if app.is_json() {
        println!("{}", json::format_report(report)?);
    } else {
        HumanRenderer::new(&app.output).render_report(report);
    }
    Ok(())
}
