//! Database layer for Coop

mod connection;
mod conflict_repository;
mod fowl_repository;
mod migrations;
mod remote;
mod transfer_repository;

pub use connection::Database;
pub use conflict_repository::SqliteConflictRepository;
pub use fowl_repository::{FowlRepository, SqliteFowlRepository};
pub use remote::SqliteRemoteStore;
pub use transfer_repository::{SqliteTransferRepository, TransferRepository};

/// Wrap a column decoding failure as a rusqlite conversion error
fn conversion_error(
    column: usize,
    error: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, error.into())
}
