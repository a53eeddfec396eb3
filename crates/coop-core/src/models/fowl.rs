//! Fowl model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::sync::{SyncMetadata, SyncableEntity};

/// A unique identifier for a fowl, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FowlId(Uuid);

impl FowlId {
    /// Create a new unique fowl ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for FowlId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FowlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FowlId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A bird tracked for breeding and traceability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fowl {
    /// Unique identifier
    pub id: FowlId,
    /// Display name or ring number
    pub name: String,
    /// Breed label
    pub breed: String,
    /// Current owner's user identifier
    pub owner_id: String,
    /// Hatch date, when known
    pub hatched_on: Option<NaiveDate>,
    /// Sync bookkeeping
    pub sync: SyncMetadata,
}

impl Fowl {
    /// Create a new fowl owned by `owner_id`
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        breed: impl Into<String>,
        owner_id: impl Into<String>,
    ) -> Self {
        Self {
            id: FowlId::new(),
            name: name.into(),
            breed: breed.into(),
            owner_id: owner_id.into(),
            hatched_on: None,
            sync: SyncMetadata::new(),
        }
    }

    /// Set the hatch date
    #[must_use]
    pub const fn with_hatched_on(mut self, hatched_on: NaiveDate) -> Self {
        self.hatched_on = Some(hatched_on);
        self
    }

    /// Hand the bird to a new owner, recording a local modification
    pub fn reassign_owner(&mut self, owner_id: impl Into<String>) {
        self.owner_id = owner_id.into();
        self.sync.touch();
    }

    /// Age in whole days at `today`, when the hatch date is known
    pub fn age_in_days(&self, today: NaiveDate) -> Option<i64> {
        self.hatched_on
            .map(|hatched_on| (today - hatched_on).num_days())
    }
}

impl SyncableEntity for Fowl {
    const KIND: &'static str = "fowl";

    fn id(&self) -> String {
        self.id.as_str()
    }

    fn sync_metadata(&self) -> &SyncMetadata {
        &self.sync
    }

    fn sync_metadata_mut(&mut self) -> &mut SyncMetadata {
        &mut self.sync
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SyncStatus;

    #[test]
    fn test_fowl_id_parse() {
        let id = FowlId::new();
        let parsed: FowlId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_fowl_new() {
        let fowl = Fowl::new("Ruby", "Rhode Island Red", "user-a");
        assert_eq!(fowl.owner_id, "user-a");
        assert_eq!(fowl.sync.sync_status, SyncStatus::PendingUpload);
        assert_eq!(fowl.sync.created_at, fowl.sync.updated_at);
    }

    #[test]
    fn test_reassign_owner_touches_metadata() {
        let mut fowl = Fowl::new("Ruby", "Rhode Island Red", "user-a");
        fowl.sync.mark(SyncStatus::Synced);
        let before = fowl.updated_at();

        fowl.reassign_owner("user-b");

        assert_eq!(fowl.owner_id, "user-b");
        assert!(fowl.updated_at() > before);
        assert_eq!(fowl.sync.sync_status, SyncStatus::PendingUpload);
    }

    #[test]
    fn test_age_in_days() {
        let hatched = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let fowl = Fowl::new("Ruby", "Silkie", "user-a").with_hatched_on(hatched);
        let today = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        assert_eq!(fowl.age_in_days(today), Some(30));

        let unknown = Fowl::new("Pearl", "Silkie", "user-a");
        assert_eq!(unknown.age_in_days(today), None);
    }
}
