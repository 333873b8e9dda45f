//! hostprep - unattended, re-runnable host provisioning

#![cfg_attr(test, allow(clippy::expect_used))]

use clap::Parser;
use hostprep_cli::cli::Cli;
use hostprep_cli::domain::StepFailure;
use hostprep_cli::output::json;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let json_mode = cli.json;

    if let Err(e) = cli.run().await {
        // Step failures are already part of the JSON report on stdout.
        if json_mode
            && e.downcast_ref::<StepFailure>().is_none()
            && let Ok(obj) = json::format_error(&format!("{e:#}"), "ERROR")
        {
            println!("{obj}");
        }
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// Diagnostics go to stderr; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
