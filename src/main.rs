mod commands;
mod render;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use calmirror_core::config::MirrorConfig;
use calmirror_core::provider::SubprocessProvider;
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "calmirror")]
#[command(about = "Mirror events from shared parent calendars into child calendars")]
struct Cli {
    /// Config file (default: ~/.config/calmirror/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log more (-v for info, -vv for debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one reconciliation pass
    Sync,
    /// Show what a sync would change, without writing anything
    Status {
        /// List every change, even for calendars with many
        #[arg(long)]
        full: bool,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the config path and the effective configuration
    Config,
    /// Sync now, then again on every interval until interrupted
    Watch {
        /// Time between runs, e.g. "15m" or "1h"
        #[arg(short, long, default_value = "15m")]
        interval: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = MirrorConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Config => commands::config::run(cli.config.as_deref(), &config),
        Commands::Sync => {
            warn_if_nothing_to_mirror(&config);
            let provider = provider(&config)?;
            commands::sync::run(&provider, &config).await.map(|_| ())
        }
        Commands::Status { full, json } => {
            warn_if_nothing_to_mirror(&config);
            let provider = provider(&config)?;
            commands::status::run(&provider, &config, full, json).await
        }
        Commands::Watch { interval } => {
            warn_if_nothing_to_mirror(&config);
            let interval = humantime::parse_duration(&interval)
                .map_err(|e| anyhow::anyhow!("Invalid interval '{}': {}", interval, e))?;
            if interval.is_zero() {
                anyhow::bail!("Interval must be longer than zero");
            }
            let provider = provider(&config)?;
            commands::watch::run(&provider, &config, interval).await
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn provider(config: &MirrorConfig) -> Result<SubprocessProvider> {
    Ok(SubprocessProvider::new(
        &config.provider,
        config.provider_timeout()?,
    ))
}

/// A run with no parents or no children is valid but does nothing.
fn warn_if_nothing_to_mirror(config: &MirrorConfig) {
    if config.parent.is_empty() || config.child.is_empty() {
        println!(
            "{}",
            "Nothing to mirror: configure at least one [[parent]] and one [[child]] calendar."
                .yellow()
        );
    }
}
