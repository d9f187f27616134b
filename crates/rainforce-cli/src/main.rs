//! Rainforce CLI
//!
//! Command-line driver for the rainfall forcing pipeline.

mod cli;
mod commands;
mod config_loader;
mod inputs;
mod output;
mod output_types;
mod storage;

use anyhow::Result;
use clap::Parser;
use cli::Cli;

fn main() -> Result<()> {
    // Logs go to stderr so that --json output stays parseable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let runtime = tokio::runtime::Runtime::new()?;

    // Failures are already reported by the output writer
    if runtime.block_on(async { commands::execute(cli).await }).is_err() {
        std::process::exit(1);
    }

    Ok(())
}
