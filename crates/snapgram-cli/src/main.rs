//! Snapgram CLI entry point.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use snapgram_cli::Command;
use snapgram_core::SnapgramConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "snapgram")]
#[command(about = "Snapgram - share photos from the command line", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, default_value = ".snapgram/config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = SnapgramConfig::load(&cli.config)?;
    tracing::debug!(config = %cli.config.display(), data_dir = %config.data_dir.display(), "loaded config");

    snapgram_cli::run(cli.command, &config).await
}
