//! coop - command-line client for the Coop flock book

mod cli;
mod commands;
mod config;
mod error;
#[cfg(test)]
mod tests;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::common::resolve_db_path;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "coop=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);

    match cli.command {
        Commands::Fowl { command } => commands::fowl::run(command, &db_path)?,
        Commands::Transfer { command } => commands::transfer::run(command, &db_path).await?,
        Commands::Sync { remote, command } => {
            commands::sync::run(command, remote, &db_path).await?;
        }
        Commands::Config { command } => commands::config::run(command)?,
        Commands::Completions { shell, output } => {
            commands::completions::run(shell, output.as_deref())?;
        }
    }

    Ok(())
}
