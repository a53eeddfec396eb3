//! Remote store backed by a second `SQLite` database

use std::path::Path;

use tokio::sync::Mutex;

use super::{Database, FowlRepository, TransferRepository};
use crate::error::{Error, Result};
use crate::models::{Fowl, SyncStatus, SyncableEntity, Transfer};
use crate::sync::RemoteStore;

/// Authoritative replica kept in its own `SQLite` file.
///
/// Stands in for the hosted document store when syncing between devices
/// that share a filesystem, and in tests.
pub struct SqliteRemoteStore {
    db: Mutex<Database>,
}

impl SqliteRemoteStore {
    /// Open (or create) the replica at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_database(Database::open(path)?))
    }

    /// In-memory replica (primarily for tests)
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_database(Database::open_in_memory()?))
    }

    pub fn from_database(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    fn as_synced<E: SyncableEntity>(entity: &E) -> E {
        let mut stored = entity.clone();
        stored.sync_metadata_mut().mark(SyncStatus::Synced);
        stored
    }
}

fn parse_id<T>(kind: &str, id: &str) -> Result<T>
where
    T: std::str::FromStr<Err = uuid::Error>,
{
    id.parse()
        .map_err(|error| Error::InvalidInput(format!("invalid {kind} id '{id}': {error}")))
}

impl RemoteStore<Fowl> for SqliteRemoteStore {
    async fn fetch(&self, id: &str) -> Result<Option<Fowl>> {
        let id = parse_id(Fowl::KIND, id)?;
        let db = self.db.lock().await;
        db.fowls().get(&id)
    }

    async fn put(&self, entity: &Fowl) -> Result<()> {
        let db = self.db.lock().await;
        db.fowls().save(&Self::as_synced(entity))
    }
}

impl RemoteStore<Transfer> for SqliteRemoteStore {
    async fn fetch(&self, id: &str) -> Result<Option<Transfer>> {
        let id = parse_id(Transfer::KIND, id)?;
        let db = self.db.lock().await;
        db.transfers().get(&id)
    }

    async fn put(&self, entity: &Transfer) -> Result<()> {
        let db = self.db.lock().await;
        db.transfers().save(&Self::as_synced(entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FowlId;

    #[tokio::test]
    async fn put_and_fetch_fowl() {
        let remote = SqliteRemoteStore::open_in_memory().unwrap();
        let fowl = Fowl::new("Ruby", "Silkie", "user-a");

        RemoteStore::<Fowl>::put(&remote, &fowl).await.unwrap();
        let fetched = RemoteStore::<Fowl>::fetch(&remote, &fowl.id())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(fetched.sync.sync_status, SyncStatus::Synced);
        assert_eq!(fetched.sync.updated_at, fowl.sync.updated_at);
    }

    #[tokio::test]
    async fn fetch_missing_transfer() {
        let remote = SqliteRemoteStore::open_in_memory().unwrap();
        let missing = RemoteStore::<Transfer>::fetch(&remote, &FowlId::new().as_str())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn fetch_rejects_malformed_id() {
        let remote = SqliteRemoteStore::open_in_memory().unwrap();
        let result = RemoteStore::<Fowl>::fetch(&remote, "not-a-uuid").await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
