//! Error types for coop-core

use thiserror::Error;

/// Result type alias using coop-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in coop-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// `SQLite` error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A transfer transition was attempted from a state that does not allow it
    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    /// Remote store error
    #[error("Remote store error: {0}")]
    Remote(String),

    /// A remote operation did not complete in time
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Unexpected internal fault
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether a retry of the same remote operation may succeed.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Remote(_) | Self::Timeout(_))
    }
}
