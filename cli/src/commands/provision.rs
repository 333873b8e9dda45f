//! `hostprep provision`: converge this host.

use anyhow::Result;
use clap::Args;
use secrecy::SecretString;
use secrecy::zeroize::Zeroize;

use crate::app::AppContext;
use crate::application::services::provision::{ProvisionContext, SETTLE_DELAY, provision};
use crate::commands::{ProvisionSettings, render_report, resolve_address};
use crate::domain::{Layout, Placeholder, PlaceholderValues, SourceSpec};
use crate::infra::LinuxHost;
use crate::output::TerminalReporter;

/// Stand-in for `YOUR_HELIUS_API_KEY` when no key is configured.
pub const UNSET_API_KEY: &str = "unset-helius-api-key";

/// Environment variable carrying an operator-supplied wallet.
pub const WALLET_ENV: &str = "TRADING_WALLET_KEY";

/// Arguments for the provision command.
#[derive(Args, Debug, Default, Clone)]
pub struct ProvisionArgs {
    /// Regenerate an existing config.yaml from the template (asks first)
    #[arg(long)]
    pub reconfigure: bool,
}

/// Entry point for `hostprep provision` (also the default command).
///
/// # Errors
///
/// Returns the failing step after the partial report has been rendered.
pub async fn run(app: &AppContext, settings: &ProvisionSettings, args: &ProvisionArgs) -> Result<()> {
    let host = LinuxHost::system(&app.layout);
    let host_address = resolve_address(settings, host.runner()).await;

    if settings
        .helius_api_key
        .as_deref()
        .is_none_or(|k| k.trim().is_empty())
    {
        app.output.warn(&format!(
            "HELIUS_API_KEY not set; configuring with placeholder '{UNSET_API_KEY}'"
        ));
    }

    let reconfigure = args.reconfigure && confirm_reconfigure(app)?;
    let ctx = build_context(
        app.layout.clone(),
        settings,
        host_address,
        wallet_from_env(),
        reconfigure,
    );

    app.output.header(&format!(
        "Provisioning {} from {} ({})",
        ctx.layout.install_root.display(),
        ctx.source.url,
        ctx.source.branch
    ));
    let run = {
        let reporter = TerminalReporter::new(&app.output);
        provision(&host, &reporter, &ctx).await
    };

    render_report(app, &run.report)?;
    match run.failure {
        Some(failure) => Err(failure.into()),
        None => Ok(()),
    }
}

/// Turn settings into the explicit context every step receives.
#[must_use]
pub fn build_context(
    layout: Layout,
    settings: &ProvisionSettings,
    host_address: String,
    wallet: Option<SecretString>,
    reconfigure: bool,
) -> ProvisionContext {
    let api_key = settings
        .helius_api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .unwrap_or(UNSET_API_KEY);
    let values = PlaceholderValues::new()
        .with(Placeholder::ApiKey, api_key)
        .with(Placeholder::HostAddress, host_address.as_str());

    ProvisionContext {
        layout,
        source: SourceSpec {
            url: settings.repo_url.clone(),
            branch: settings.branch.clone(),
        },
        host_address,
        values,
        wallet,
        settle_delay: SETTLE_DELAY,
        reconfigure,
    }
}

/// Operator wallet from `TRADING_WALLET_KEY`, trimmed; blank counts as unset.
fn wallet_from_env() -> Option<SecretString> {
    let mut raw = std::env::var(WALLET_ENV).ok()?;
    let trimmed = raw.trim();
    let wallet = (!trimmed.is_empty()).then(|| SecretString::from(trimmed.to_owned()));
    raw.zeroize();
    wallet
}

fn confirm_reconfigure(app: &AppContext) -> Result<bool> {
    let config = app.layout.config_file();
    if !config.exists() {
        return Ok(false);
    }
    let confirmed = app.confirm(&format!(
        "Overwrite {} with a fresh copy of the template? Manual edits will be lost",
        config.display()
    ))?;
    if !confirmed {
        app.output
            .warn("reconfiguration not confirmed; keeping the existing configuration");
    }
    Ok(confirmed)
}
