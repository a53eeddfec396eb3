//! Remote store abstraction

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::models::{SyncStatus, SyncableEntity};

/// Authoritative server-side copy of one entity kind.
///
/// Writes must already satisfy the remote schema constraints; the core does
/// not validate them.
#[allow(async_fn_in_trait)]
pub trait RemoteStore<E: SyncableEntity> {
    /// Fetch the remote copy of the record, `None` when it was never uploaded
    async fn fetch(&self, id: &str) -> Result<Option<E>>;

    /// Store `entity` as the authoritative copy
    async fn put(&self, entity: &E) -> Result<()>;
}

/// In-process remote store keyed by entity id.
///
/// Can simulate latency and transient fetch failures.
pub struct MemoryRemoteStore<E> {
    records: Mutex<HashMap<String, E>>,
    failing_fetches: AtomicU32,
    latency: Option<Duration>,
}

impl<E: SyncableEntity> MemoryRemoteStore<E> {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            failing_fetches: AtomicU32::new(0),
            latency: None,
        }
    }

    /// Delay every call by `latency`
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make the next `count` fetches fail with a transient error
    pub fn fail_next_fetches(&self, count: u32) {
        self.failing_fetches.store(count, Ordering::SeqCst);
    }

    /// Seed a record without touching its metadata
    pub fn insert(&self, entity: E) -> Result<()> {
        self.lock()?.insert(entity.id(), entity);
        Ok(())
    }

    /// Snapshot of the stored copy
    pub fn get(&self, id: &str) -> Result<Option<E>> {
        Ok(self.lock()?.get(id).cloned())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, E>>> {
        self.records
            .lock()
            .map_err(|_| Error::Internal("remote store lock poisoned".to_string()))
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl<E: SyncableEntity> Default for MemoryRemoteStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: SyncableEntity> RemoteStore<E> for MemoryRemoteStore<E> {
    async fn fetch(&self, id: &str) -> Result<Option<E>> {
        self.simulate_latency().await;

        let should_fail = self
            .failing_fetches
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                remaining.checked_sub(1)
            })
            .is_ok();
        if should_fail {
            return Err(Error::Remote(format!("simulated failure fetching {id}")));
        }

        self.get(id)
    }

    async fn put(&self, entity: &E) -> Result<()> {
        self.simulate_latency().await;

        let mut stored = entity.clone();
        stored.sync_metadata_mut().mark(SyncStatus::Synced);
        self.lock()?.insert(stored.id(), stored);
        Ok(())
    }
}
