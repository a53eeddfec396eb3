//! Data models for Coop

mod fowl;
mod sync;
mod sync_conflict;
mod transfer;

pub use fowl::{Fowl, FowlId};
pub use sync::{SyncMetadata, SyncStatus, SyncableEntity};
pub use sync_conflict::{SyncConflict, LWW_STRATEGY};
pub use transfer::{Transfer, TransferId, TransferStatus, VerificationDetails};
