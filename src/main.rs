//! Ambience lighting CLI
//!
//! Runs the WiZ lighting daemon and a few operator tools around it.

use anyhow::Result;
use clap::Parser;

// CLI definitions
mod cli;
use cli::{Cli, Commands};

// Command handlers
mod commands;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging. Stdout carries the daemon protocol, so logs go to stderr.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = commands::lights_config_path(cli.config.as_deref());

    match cli.command {
        Commands::Daemon(args) => commands::daemon::run(&config_path, &args).await,
        Commands::Check { file } => commands::check::run(&file),
        Commands::Preview { file } => commands::preview::run(&file),
        Commands::Bulbs => commands::bulbs::run(&config_path),
        Commands::Set(args) => commands::set::run(&config_path, &args).await,
    }
}
