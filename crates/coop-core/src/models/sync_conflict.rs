//! Sync conflict model

use serde::{Deserialize, Serialize};

/// Strategy label recorded for last-write-wins resolutions
pub const LWW_STRATEGY: &str = "lww";

/// Recorded sync conflict resolved by strategy (e.g., LWW)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConflict {
    /// Conflict row identifier
    pub id: i64,
    /// Kind of entity involved (e.g., "fowl", "transfer")
    pub entity_kind: String,
    /// Entity involved in the conflict
    pub entity_id: String,
    /// Local copy's timestamp when the conflict was resolved
    pub local_updated_at: i64,
    /// Remote copy's timestamp when the conflict was resolved
    pub remote_updated_at: i64,
    /// Resolution timestamp (unix ms)
    pub resolved_at: i64,
    /// Which copy was kept: "local" or "remote"
    pub winner: String,
    /// Resolution strategy name
    pub strategy: String,
}
