//! Public address detection for the summary endpoints and `YOUR_SERVER_IP`.
//!
//! Order: public echo service, then the first `hostname -I` address, then
//! loopback. Detection never fails.

use std::net::IpAddr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::CommandRunner;

pub const PUBLIC_IP_URL: &str = "https://api.ipify.org";
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);
pub const LOOPBACK: &str = "127.0.0.1";

/// Best-effort address of this host as seen by operators, asking the echo
/// service at `lookup_url` first.
pub async fn detect_host_address(lookup_url: &str, runner: &impl CommandRunner) -> String {
    match public_address(lookup_url.to_string()).await {
        Ok(ip) => return ip.to_string(),
        Err(e) => tracing::debug!(error = %format!("{e:#}"), "public address lookup failed"),
    }
    match runner.run("hostname", &["-I"]).await {
        Ok(output) if output.status.success() => {
            if let Some(ip) = first_address(&String::from_utf8_lossy(&output.stdout)) {
                return ip.to_string();
            }
        }
        Ok(_) => tracing::debug!("hostname -I exited non-zero"),
        Err(e) => tracing::debug!(error = %e, "hostname -I failed"),
    }
    LOOPBACK.to_string()
}

async fn public_address(url: String) -> Result<IpAddr> {
    let body = tokio::task::spawn_blocking(move || {
        ureq::get(&url)
            .timeout(LOOKUP_TIMEOUT)
            .set("User-Agent", "hostprep")
            .call()
            .with_context(|| format!("requesting {url}"))?
            .into_string()
            .context("reading response")
    })
    .await
    .map_err(|e| anyhow::anyhow!("spawn_blocking panicked: {e}"))??;
    body.trim()
        .parse()
        .with_context(|| format!("not an IP address: {:?}", body.trim()))
}

/// First parseable address in `hostname -I` output.
pub(crate) fn first_address(output: &str) -> Option<IpAddr> {
    output.split_whitespace().find_map(|t| t.parse().ok())
}
