//! Sync driver: reconciles unsynced local records with the remote store

use std::future::Future;
use std::ops::AddAssign;

use serde::Serialize;

use super::remote::RemoteStore;
use super::resolver::{ConflictResolver, LastWriteWins, Resolution};
use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::models::{SyncConflict, SyncStatus, SyncableEntity, LWW_STRATEGY};
use crate::util::now_ms;

/// On-device persistence the driver reads from and writes back to.
///
/// The `expected_updated_at` guards make write-backs a no-op (returning
/// `false`) when the record was edited locally while the remote call was in
/// flight; the edit is then picked up by the next pass.
pub trait LocalStore<E: SyncableEntity> {
    /// Records whose status is not SYNCED
    fn list_unsynced(&self) -> Result<Vec<E>>;

    /// Set the sync status if the stored `updated_at` still matches
    fn set_sync_status(&self, id: &str, expected_updated_at: i64, status: SyncStatus)
        -> Result<bool>;

    /// Overwrite the stored record if its `updated_at` still matches
    fn replace(&self, entity: &E, expected_updated_at: i64) -> Result<bool>;
}

/// Append-only log of reconciliations where both copies existed.
pub trait ConflictLog {
    /// Record a resolved conflict; `conflict.id` is assigned by the log
    fn record(&self, conflict: &SyncConflict) -> Result<i64>;
}

/// Outcome of one sync pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Unsynced local records looked at
    pub examined: usize,
    /// Local copies pushed to the remote store
    pub uploaded: usize,
    /// Remote copies written over local ones
    pub downloaded: usize,
    /// Records left FAILED for a later pass
    pub failed: usize,
    /// Records edited locally mid-sync and left for a later pass
    pub deferred: usize,
}

impl AddAssign for SyncReport {
    fn add_assign(&mut self, other: Self) {
        self.examined += other.examined;
        self.uploaded += other.uploaded;
        self.downloaded += other.downloaded;
        self.failed += other.failed;
        self.deferred += other.deferred;
    }
}

/// Drives conflict resolution for every unsynced record of one kind.
pub struct Synchronizer<'a, C = LastWriteWins> {
    config: SyncConfig,
    resolver: C,
    conflict_log: Option<&'a dyn ConflictLog>,
}

impl Synchronizer<'_> {
    /// Synchronizer using last-write-wins
    pub const fn new(config: SyncConfig) -> Self {
        Self {
            config,
            resolver: LastWriteWins,
            conflict_log: None,
        }
    }
}

impl<'a, C: ConflictResolver> Synchronizer<'a, C> {
    /// Swap the resolution policy
    pub fn with_resolver<D: ConflictResolver>(self, resolver: D) -> Synchronizer<'a, D> {
        Synchronizer {
            config: self.config,
            resolver,
            conflict_log: self.conflict_log,
        }
    }

    /// Record every two-sided reconciliation in `log`
    #[must_use]
    pub fn with_conflict_log(mut self, log: &'a dyn ConflictLog) -> Self {
        self.conflict_log = Some(log);
        self
    }

    /// Reconcile every unsynced local record of kind `E`.
    ///
    /// Remote failures are contained per record: the record is marked
    /// FAILED and the pass continues. Local persistence errors abort the
    /// pass.
    pub async fn sync_kind<E, L, R>(&self, local: &L, remote: &R) -> Result<SyncReport>
    where
        E: SyncableEntity,
        L: LocalStore<E>,
        R: RemoteStore<E>,
    {
        let mut report = SyncReport::default();

        for entity in local.list_unsynced()? {
            report.examined += 1;
            let id = entity.id();
            let local_updated_at = entity.updated_at();

            let remote_copy = match self.fetch(remote, &id).await {
                Ok(copy) => copy,
                Err(error) => {
                    tracing::warn!(kind = E::KIND, %id, %error, "Failed to fetch remote copy");
                    local.set_sync_status(&id, local_updated_at, SyncStatus::Failed)?;
                    report.failed += 1;
                    continue;
                }
            };

            let remote_updated_at = remote_copy.as_ref().map(SyncableEntity::updated_at);
            let resolution = self.resolver.resolve(entity, remote_copy);
            tracing::debug!(
                kind = E::KIND,
                %id,
                local_updated_at,
                ?remote_updated_at,
                winner = resolution.source(),
                "Resolved sync candidate"
            );

            if let Some(remote_updated_at) = remote_updated_at {
                self.log_conflict::<E>(&id, local_updated_at, remote_updated_at, &resolution)?;
            }

            let applied = match resolution {
                Resolution::UseLocal(entity) => match self.put(remote, &entity).await {
                    Ok(()) => {
                        let applied =
                            local.set_sync_status(&id, local_updated_at, SyncStatus::Synced)?;
                        if applied {
                            report.uploaded += 1;
                        }
                        applied
                    }
                    Err(error) => {
                        tracing::warn!(kind = E::KIND, %id, %error, "Failed to upload local copy");
                        local.set_sync_status(&id, local_updated_at, SyncStatus::Failed)?;
                        report.failed += 1;
                        true
                    }
                },
                Resolution::UseRemote(mut entity) => {
                    entity.sync_metadata_mut().mark(SyncStatus::Synced);
                    let applied = local.replace(&entity, local_updated_at)?;
                    if applied {
                        report.downloaded += 1;
                    }
                    applied
                }
            };

            if !applied {
                tracing::debug!(kind = E::KIND, %id, "Record changed during sync, deferring");
                report.deferred += 1;
            }
        }

        tracing::info!(
            kind = E::KIND,
            examined = report.examined,
            uploaded = report.uploaded,
            downloaded = report.downloaded,
            failed = report.failed,
            "Sync pass finished"
        );
        Ok(report)
    }

    async fn fetch<E, R>(&self, remote: &R, id: &str) -> Result<Option<E>>
    where
        E: SyncableEntity,
        R: RemoteStore<E>,
    {
        self.with_retry("fetch", move || remote.fetch(id)).await
    }

    async fn put<E, R>(&self, remote: &R, entity: &E) -> Result<()>
    where
        E: SyncableEntity,
        R: RemoteStore<E>,
    {
        self.with_retry("put", move || remote.put(entity)).await
    }

    /// Run `op` under the configured timeout, retrying transient failures
    /// with exponential backoff.
    async fn with_retry<T, F, Fut>(&self, operation: &str, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            let result = match tokio::time::timeout(self.config.fetch_timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(Error::Timeout(format!(
                    "remote {operation} exceeded {:?}",
                    self.config.fetch_timeout
                ))),
            };

            match result {
                Err(error) if error.is_transient() && attempt < self.config.max_attempts => {
                    let delay = self.config.backoff_for(attempt);
                    tracing::warn!(
                        operation,
                        attempt,
                        %error,
                        "Remote call failed, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    fn log_conflict<E: SyncableEntity>(
        &self,
        id: &str,
        local_updated_at: i64,
        remote_updated_at: i64,
        resolution: &Resolution<E>,
    ) -> Result<()> {
        let Some(log) = self.conflict_log else {
            return Ok(());
        };

        log.record(&SyncConflict {
            id: 0,
            entity_kind: E::KIND.to_string(),
            entity_id: id.to_string(),
            local_updated_at,
            remote_updated_at,
            resolved_at: now_ms(),
            winner: resolution.source().to_string(),
            strategy: LWW_STRATEGY.to_string(),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::time::Duration;

    use super::*;
    use crate::models::Fowl;
    use crate::sync::remote::MemoryRemoteStore;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct VecStore {
        records: RefCell<BTreeMap<String, Fowl>>,
    }

    impl VecStore {
        fn with(fowls: &[Fowl]) -> Self {
            let store = Self::default();
            for fowl in fowls {
                store.records.borrow_mut().insert(fowl.id(), fowl.clone());
            }
            store
        }

        fn get(&self, id: &str) -> Fowl {
            self.records.borrow()[id].clone()
        }
    }

    impl LocalStore<Fowl> for VecStore {
        fn list_unsynced(&self) -> Result<Vec<Fowl>> {
            Ok(self
                .records
                .borrow()
                .values()
                .filter(|fowl| fowl.sync.sync_status.needs_sync())
                .cloned()
                .collect())
        }

        fn set_sync_status(
            &self,
            id: &str,
            expected_updated_at: i64,
            status: SyncStatus,
        ) -> Result<bool> {
            let mut records = self.records.borrow_mut();
            match records.get_mut(id) {
                Some(fowl) if fowl.updated_at() == expected_updated_at => {
                    fowl.sync.mark(status);
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        fn replace(&self, entity: &Fowl, expected_updated_at: i64) -> Result<bool> {
            let mut records = self.records.borrow_mut();
            match records.get_mut(&entity.id()) {
                Some(fowl) if fowl.updated_at() == expected_updated_at => {
                    *fowl = entity.clone();
                    Ok(true)
                }
                _ => Ok(false),
            }
        }
    }

    #[derive(Default)]
    struct RecordingLog {
        entries: RefCell<Vec<SyncConflict>>,
    }

    impl ConflictLog for RecordingLog {
        fn record(&self, conflict: &SyncConflict) -> Result<i64> {
            let mut entries = self.entries.borrow_mut();
            entries.push(conflict.clone());
            Ok(i64::try_from(entries.len()).unwrap_or(i64::MAX))
        }
    }

    fn fast_config() -> SyncConfig {
        SyncConfig::default()
            .with_fetch_timeout(Duration::from_millis(200))
            .with_initial_backoff(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn uploads_records_missing_remotely() {
        let fowl = Fowl::new("Ruby", "Silkie", "user-a");
        let local = VecStore::with(&[fowl.clone()]);
        let remote = MemoryRemoteStore::new();

        let report = Synchronizer::new(fast_config())
            .sync_kind(&local, &remote)
            .await
            .unwrap();

        assert_eq!(report.examined, 1);
        assert_eq!(report.uploaded, 1);
        assert_eq!(local.get(&fowl.id()).sync.sync_status, SyncStatus::Synced);
        assert_eq!(remote.get(&fowl.id()).unwrap().unwrap().name, "Ruby");
    }

    #[tokio::test]
    async fn downloads_newer_remote_copy_and_logs_conflict() {
        let fowl = Fowl::new("Ruby", "Silkie", "user-a");
        let mut newer = fowl.clone();
        newer.owner_id = "user-b".to_string();
        newer.sync.updated_at = fowl.sync.updated_at + 1000;

        let local = VecStore::with(&[fowl.clone()]);
        let remote = MemoryRemoteStore::new();
        remote.insert(newer).unwrap();
        let log = RecordingLog::default();

        let report = Synchronizer::new(fast_config())
            .with_conflict_log(&log)
            .sync_kind(&local, &remote)
            .await
            .unwrap();

        assert_eq!(report.downloaded, 1);
        let stored = local.get(&fowl.id());
        assert_eq!(stored.owner_id, "user-b");
        assert_eq!(stored.sync.sync_status, SyncStatus::Synced);

        let entries = log.entries.borrow();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].winner, "remote");
        assert_eq!(entries[0].strategy, "lww");
        assert_eq!(entries[0].entity_kind, "fowl");
    }

    #[tokio::test]
    async fn newer_local_copy_overwrites_remote() {
        let mut fowl = Fowl::new("Ruby", "Silkie", "user-a");
        let mut stale = fowl.clone();
        stale.name = "Old name".to_string();
        fowl.sync.updated_at += 5000;

        let local = VecStore::with(&[fowl.clone()]);
        let remote = MemoryRemoteStore::new();
        remote.insert(stale).unwrap();

        let report = Synchronizer::new(fast_config())
            .sync_kind(&local, &remote)
            .await
            .unwrap();

        assert_eq!(report.uploaded, 1);
        assert_eq!(remote.get(&fowl.id()).unwrap().unwrap().name, "Ruby");
    }

    #[tokio::test]
    async fn transient_fetch_failures_are_retried() {
        let fowl = Fowl::new("Ruby", "Silkie", "user-a");
        let local = VecStore::with(&[fowl.clone()]);
        let remote = MemoryRemoteStore::new();
        remote.fail_next_fetches(2);

        let report = Synchronizer::new(fast_config().with_max_attempts(3))
            .sync_kind(&local, &remote)
            .await
            .unwrap();

        assert_eq!(report.uploaded, 1);
        assert_eq!(report.failed, 0);
    }

    #[tokio::test]
    async fn exhausted_retries_mark_failed_without_resolution() {
        let fowl = Fowl::new("Ruby", "Silkie", "user-a");
        let local = VecStore::with(&[fowl.clone()]);
        let remote = MemoryRemoteStore::new();
        remote.fail_next_fetches(5);

        let report = Synchronizer::new(fast_config().with_max_attempts(2))
            .sync_kind(&local, &remote)
            .await
            .unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(local.get(&fowl.id()).sync.sync_status, SyncStatus::Failed);
        assert!(remote.is_empty().unwrap());
    }

    #[tokio::test]
    async fn slow_remote_times_out() {
        let fowl = Fowl::new("Ruby", "Silkie", "user-a");
        let local = VecStore::with(&[fowl.clone()]);
        let remote = MemoryRemoteStore::new().with_latency(Duration::from_millis(500));

        let config = fast_config()
            .with_fetch_timeout(Duration::from_millis(10))
            .with_max_attempts(1);
        let report = Synchronizer::new(config)
            .sync_kind(&local, &remote)
            .await
            .unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(local.get(&fowl.id()).sync.sync_status, SyncStatus::Failed);
    }

    #[tokio::test]
    async fn dropped_pass_leaves_local_state_unchanged() {
        let fowl = Fowl::new("Ruby", "Silkie", "user-a");
        let local = VecStore::with(&[fowl.clone()]);
        let remote = MemoryRemoteStore::new().with_latency(Duration::from_millis(500));
        let synchronizer = Synchronizer::new(fast_config().with_fetch_timeout(Duration::from_secs(5)));

        let cancelled = tokio::time::timeout(
            Duration::from_millis(20),
            synchronizer.sync_kind(&local, &remote),
        )
        .await;

        assert!(cancelled.is_err());
        assert_eq!(local.get(&fowl.id()), fowl);
        assert!(remote.is_empty().unwrap());
    }

    struct LocalAlwaysWins;

    impl ConflictResolver for LocalAlwaysWins {
        fn resolve<E: SyncableEntity>(&self, local: E, _remote: Option<E>) -> Resolution<E> {
            Resolution::UseLocal(local)
        }
    }

    #[tokio::test]
    async fn custom_resolver_replaces_last_write_wins() {
        let fowl = Fowl::new("Ruby", "Silkie", "user-a");
        let mut newer = fowl.clone();
        newer.owner_id = "user-b".to_string();
        newer.sync.updated_at = fowl.sync.updated_at + 1000;

        let local = VecStore::with(&[fowl.clone()]);
        let remote = MemoryRemoteStore::new();
        remote.insert(newer).unwrap();
        let log = RecordingLog::default();

        let report = Synchronizer::new(fast_config())
            .with_conflict_log(&log)
            .with_resolver(LocalAlwaysWins)
            .sync_kind(&local, &remote)
            .await
            .unwrap();

        assert_eq!(report.uploaded, 1);
        assert_eq!(remote.get(&fowl.id()).unwrap().unwrap().owner_id, "user-a");
        assert_eq!(log.entries.borrow()[0].winner, "local");
    }

    #[tokio::test]
    async fn failed_records_are_retried_on_next_pass() {
        let fowl = Fowl::new("Ruby", "Silkie", "user-a");
        let local = VecStore::with(&[fowl.clone()]);
        let remote = MemoryRemoteStore::new();
        remote.fail_next_fetches(1);

        let synchronizer = Synchronizer::new(fast_config().with_max_attempts(1));
        let first = synchronizer.sync_kind(&local, &remote).await.unwrap();
        let second = synchronizer.sync_kind(&local, &remote).await.unwrap();

        assert_eq!(first.failed, 1);
        assert_eq!(second.uploaded, 1);
        assert_eq!(local.get(&fowl.id()).sync.sync_status, SyncStatus::Synced);
    }

    #[tokio::test]
    async fn synced_records_are_skipped() {
        let mut fowl = Fowl::new("Ruby", "Silkie", "user-a");
        fowl.sync.mark(SyncStatus::Synced);
        let local = VecStore::with(&[fowl]);
        let remote = MemoryRemoteStore::new();

        let report = Synchronizer::new(fast_config())
            .sync_kind(&local, &remote)
            .await
            .unwrap();

        assert_eq!(report, SyncReport::default());
    }

    #[test]
    fn reports_add_up() {
        let mut total = SyncReport {
            examined: 2,
            uploaded: 1,
            downloaded: 1,
            failed: 0,
            deferred: 0,
        };
        total += SyncReport {
            examined: 1,
            uploaded: 0,
            downloaded: 0,
            failed: 1,
            deferred: 0,
        };
        assert_eq!(total.examined, 3);
        assert_eq!(total.failed, 1);
    }
}
