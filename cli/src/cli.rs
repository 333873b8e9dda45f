//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags};
use crate::commands;

/// Provision this Ubuntu host for the trading bot and its dashboard
#[derive(Parser)]
#[command(name = "hostprep", version, propagate_version = true)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Log every external command to stderr (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Answer yes to confirmations
    #[arg(short, long, global = true, env = "HOSTPREP_YES")]
    pub yes: bool,

    #[command(flatten)]
    pub settings: commands::ProvisionSettings,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Converge this host (default)
    Provision(commands::provision::ProvisionArgs),

    /// Show the current state of this host without changing anything
    Status,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            json,
            quiet,
            no_color,
            verbose: _,
            yes,
            settings,
            command,
        } = self;
        let app = AppContext::new(&AppFlags {
            output: OutputFlags {
                no_color,
                quiet,
                json,
            },
            behaviour: BehaviourFlags { yes },
        })?;

        match command.unwrap_or_else(|| Command::Provision(Default::default())) {
            Command::Provision(args) => commands::provision::run(&app, &settings, &args).await,
            Command::Status => commands::status::run(&app, &settings).await,
        }
    }
}
