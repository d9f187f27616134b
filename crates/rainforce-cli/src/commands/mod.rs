//! Command implementations

mod config;
mod hyetograph;
mod partition;
mod run;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use anyhow::Result;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config_file = cli.config.as_deref();

    let result = match cli.command {
        Commands::Run(args) => run::execute(args, &output, cli.storage, config_file).await,
        Commands::Partition(args) => partition::execute(args, &output, cli.storage, config_file).await,
        Commands::Hyetograph(args) => hyetograph::execute(args, &output, cli.storage, config_file).await,
        Commands::Config(args) => config::execute(args, &output, config_file),
    };

    if let Err(e) = &result {
        output.error(format!("{:#}", e));
    }
    result
}
