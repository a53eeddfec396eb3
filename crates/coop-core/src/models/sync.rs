//! Sync metadata carried by every synchronizable record

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::util::now_ms;

/// Lifecycle marker for a record's sync state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    /// Changed locally, not yet reconciled with the remote store
    #[default]
    PendingUpload,
    /// Local and remote copies agree
    Synced,
    /// Marked for another reconciliation pass
    Conflict,
    /// Last reconciliation attempt failed
    Failed,
}

impl SyncStatus {
    /// Stable text form used for persistence
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingUpload => "PENDING_UPLOAD",
            Self::Synced => "SYNCED",
            Self::Conflict => "CONFLICT",
            Self::Failed => "FAILED",
        }
    }

    /// Whether the sync driver still has work to do for this record
    pub const fn needs_sync(self) -> bool {
        !matches!(self, Self::Synced)
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING_UPLOAD" => Ok(Self::PendingUpload),
            "SYNCED" => Ok(Self::Synced),
            "CONFLICT" => Ok(Self::Conflict),
            "FAILED" => Ok(Self::Failed),
            other => Err(format!("unknown sync status '{other}'")),
        }
    }
}

/// Sync bookkeeping attached to every synchronizable entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMetadata {
    /// Current sync lifecycle marker
    pub sync_status: SyncStatus,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last modification timestamp (Unix ms); orders conflict resolution
    pub updated_at: i64,
}

impl SyncMetadata {
    /// Metadata for a record created right now
    #[must_use]
    pub fn new() -> Self {
        let now = now_ms();
        Self {
            sync_status: SyncStatus::PendingUpload,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a local modification.
    ///
    /// `updated_at` strictly increases even when the wall clock has not
    /// advanced since the previous edit.
    pub fn touch(&mut self) {
        self.updated_at = now_ms().max(self.updated_at + 1);
        self.sync_status = SyncStatus::PendingUpload;
    }

    /// Change the sync status without touching timestamps
    pub fn mark(&mut self, status: SyncStatus) {
        self.sync_status = status;
    }
}

impl Default for SyncMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// A uniquely identified record that takes part in synchronization.
pub trait SyncableEntity: Clone {
    /// Entity kind label, used in conflict logs and remote collections
    const KIND: &'static str;

    /// Identity of the logical record
    fn id(&self) -> String;

    /// Sync bookkeeping
    fn sync_metadata(&self) -> &SyncMetadata;

    /// Mutable sync bookkeeping
    fn sync_metadata_mut(&mut self) -> &mut SyncMetadata;

    /// Last modification timestamp (Unix ms)
    fn updated_at(&self) -> i64 {
        self.sync_metadata().updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_status_text_form() {
        for status in [
            SyncStatus::PendingUpload,
            SyncStatus::Synced,
            SyncStatus::Conflict,
            SyncStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<SyncStatus>().unwrap(), status);
        }
        assert!("synced".parse::<SyncStatus>().is_err());
    }

    #[test]
    fn test_sync_status_serializes_upper_case() {
        let json = serde_json::to_string(&SyncStatus::PendingUpload).unwrap();
        assert_eq!(json, "\"PENDING_UPLOAD\"");
    }

    #[test]
    fn test_needs_sync() {
        assert!(SyncStatus::PendingUpload.needs_sync());
        assert!(SyncStatus::Failed.needs_sync());
        assert!(SyncStatus::Conflict.needs_sync());
        assert!(!SyncStatus::Synced.needs_sync());
    }

    #[test]
    fn test_touch_is_strictly_increasing() {
        let mut meta = SyncMetadata::new();
        meta.sync_status = SyncStatus::Synced;
        meta.updated_at = i64::MAX / 2;

        let before = meta.updated_at;
        meta.touch();
        assert_eq!(meta.updated_at, before + 1);
        assert_eq!(meta.sync_status, SyncStatus::PendingUpload);
    }

    #[test]
    fn test_mark_keeps_timestamps() {
        let mut meta = SyncMetadata::new();
        let snapshot = meta;
        meta.mark(SyncStatus::Failed);
        assert_eq!(meta.updated_at, snapshot.updated_at);
        assert_eq!(meta.created_at, snapshot.created_at);
        assert_eq!(meta.sync_status, SyncStatus::Failed);
    }
}
