//! coop-core - Core library for Coop
//!
//! This crate contains the offline-first data core shared by every Coop
//! client: sync metadata and the conflict resolver, the ownership-transfer
//! state machine, local SQLite persistence, and the sync driver that
//! reconciles local records with the remote store.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod sync;
pub mod transfer;
pub mod util;

pub use error::{Error, Result};
pub use models::{
    Fowl, FowlId, SyncConflict, SyncMetadata, SyncStatus, SyncableEntity, Transfer, TransferId,
    TransferStatus, VerificationDetails,
};
pub use sync::{resolve, ConflictResolver, LastWriteWins, Resolution};
pub use transfer::{TransferState, TransferStateMachine};
