use std::path::PathBuf;

use crate::cli::ConfigCommands;
use crate::config::{default_config_path, CliConfig};
use crate::error::CliError;

pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show => show(),
        ConfigCommands::Set {
            remote,
            fetch_timeout_ms,
            max_attempts,
        } => set(remote, fetch_timeout_ms, max_attempts),
    }
}

fn show() -> Result<(), CliError> {
    let config = CliConfig::load().map_err(CliError::Config)?;
    let sync = config.sync_config();

    println!("config:         {}", default_config_path().display());
    println!(
        "remote:         {}",
        config
            .resolve_remote_path(None)
            .map_or_else(|| "(not set)".to_string(), |path| path.display().to_string())
    );
    println!("fetch timeout:  {} ms", sync.fetch_timeout.as_millis());
    println!("max attempts:   {}", sync.max_attempts);
    Ok(())
}

fn set(
    remote: Option<PathBuf>,
    fetch_timeout_ms: Option<u64>,
    max_attempts: Option<u32>,
) -> Result<(), CliError> {
    if remote.is_none() && fetch_timeout_ms.is_none() && max_attempts.is_none() {
        return Err(CliError::Config(
            "nothing to set; pass --remote, --fetch-timeout-ms or --max-attempts".to_string(),
        ));
    }

    let mut config = CliConfig::load().map_err(CliError::Config)?;
    apply(&mut config, remote, fetch_timeout_ms, max_attempts)?;
    let path = config.save().map_err(CliError::Config)?;

    tracing::debug!(path = %path.display(), "Saved CLI config");
    println!("Saved {}", path.display());
    Ok(())
}

pub fn apply(
    config: &mut CliConfig,
    remote: Option<PathBuf>,
    fetch_timeout_ms: Option<u64>,
    max_attempts: Option<u32>,
) -> Result<(), CliError> {
    if fetch_timeout_ms == Some(0) {
        return Err(CliError::Config("fetch timeout must be positive".to_string()));
    }
    if max_attempts == Some(0) {
        return Err(CliError::Config("max attempts must be at least 1".to_string()));
    }

    if remote.is_some() {
        config.remote_db_path = remote;
    }
    if fetch_timeout_ms.is_some() {
        config.fetch_timeout_ms = fetch_timeout_ms;
    }
    if max_attempts.is_some() {
        config.max_attempts = max_attempts;
    }
    Ok(())
}
