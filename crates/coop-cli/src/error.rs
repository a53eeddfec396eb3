use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] coop_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("ID cannot be empty")]
    EmptyId,
    #[error("No {kind} found for id/prefix: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("{0}")]
    AmbiguousId(String),
    #[error("Invalid verification detail '{0}', expected KEY=VALUE")]
    InvalidDetail(String),
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(
        "Sync is not configured. Pass --remote <PATH>, run `coop config set --remote <PATH>`, or set COOP_REMOTE_DB_PATH."
    )]
    SyncNotConfigured,
}
