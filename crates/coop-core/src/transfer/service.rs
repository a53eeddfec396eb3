//! Persists transfer transitions and echoes them to the remote store

use crate::config::SyncConfig;
use crate::db::{Database, FowlRepository, TransferRepository};
use crate::error::{Error, Result};
use crate::models::{
    Fowl, FowlId, SyncStatus, SyncableEntity, Transfer, TransferStatus, VerificationDetails,
};
use crate::sync::{LocalStore, RemoteStore};

use super::machine::{TransferState, TransferStateMachine};

/// Drives a [`TransferStateMachine`] on behalf of a user and writes every
/// successful transition through to local storage and, when attached, the
/// remote store.
///
/// A failed remote push never undoes a transition: the record stays FAILED
/// locally and the next sync pass uploads it.
pub struct TransferService<'a, R> {
    db: &'a Database,
    remote: Option<&'a R>,
    config: SyncConfig,
}

impl<'a, R> TransferService<'a, R>
where
    R: RemoteStore<Transfer> + RemoteStore<Fowl>,
{
    pub fn new(db: &'a Database, remote: Option<&'a R>) -> Self {
        Self {
            db,
            remote,
            config: SyncConfig::default(),
        }
    }

    #[must_use]
    pub const fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Open a transfer of `fowl_id` from its owner `giver_id` to `receiver_id`.
    pub async fn initiate(
        &self,
        machine: &TransferStateMachine,
        fowl_id: &FowlId,
        giver_id: &str,
        receiver_id: &str,
    ) -> Result<Transfer> {
        let receiver_id = receiver_id.trim();
        if receiver_id == giver_id {
            return Err(Error::InvalidInput(
                "transfer giver and receiver must differ".to_string(),
            ));
        }

        let fowl = self.require_fowl(fowl_id)?;
        if fowl.owner_id != giver_id {
            return Err(Error::InvalidInput(format!(
                "fowl {fowl_id} is owned by {}, not {giver_id}",
                fowl.owner_id
            )));
        }

        let open = self
            .db
            .transfers()
            .list_for_fowl(fowl_id)?
            .into_iter()
            .find(|transfer| transfer.status == TransferStatus::Pending);
        if let Some(open) = open {
            return Err(Error::InvalidTransition(format!(
                "fowl {fowl_id} already has pending transfer {}",
                open.id
            )));
        }

        let draft = Transfer::new(fowl.id, giver_id, receiver_id);
        let state = machine.initiate_transfer(draft)?;
        self.write_through(state).await
    }

    /// Accept a pending transfer; the fowl changes hands.
    pub async fn verify(
        &self,
        machine: &TransferStateMachine,
        transfer: &Transfer,
        details: VerificationDetails,
    ) -> Result<Transfer> {
        let mut fowl = self.require_fowl(&transfer.fowl_id)?;

        let state = machine.verify_transfer(transfer, details)?;
        let verified = self.write_through(state).await?;

        fowl.reassign_owner(verified.receiver_id.clone());
        self.db.fowls().save(&fowl)?;
        self.push(&mut fowl, &self.db.fowls()).await?;
        tracing::info!(
            transfer_id = %verified.id,
            fowl_id = %fowl.id,
            owner = %fowl.owner_id,
            "Ownership transferred"
        );
        Ok(verified)
    }

    /// Decline a pending transfer.
    pub async fn reject(
        &self,
        machine: &TransferStateMachine,
        transfer: &Transfer,
    ) -> Result<Transfer> {
        let state = machine.reject_transfer(transfer)?;
        self.write_through(state).await
    }

    fn require_fowl(&self, fowl_id: &FowlId) -> Result<Fowl> {
        self.db
            .fowls()
            .get(fowl_id)?
            .ok_or_else(|| Error::NotFound(format!("fowl {fowl_id}")))
    }

    async fn write_through(&self, state: TransferState) -> Result<Transfer> {
        let label = state.label();
        let mut transfer = state.into_transfer().ok_or_else(|| {
            Error::Internal(format!("transition ended in {label} without a transfer"))
        })?;

        let transfers = self.db.transfers();
        transfers.save(&transfer)?;
        self.push(&mut transfer, &transfers).await?;
        Ok(transfer)
    }

    /// Push a locally saved record; records the outcome as its sync status.
    async fn push<E, L>(&self, entity: &mut E, local: &L) -> Result<()>
    where
        E: SyncableEntity,
        L: LocalStore<E>,
        R: RemoteStore<E>,
    {
        let Some(remote) = self.remote else {
            return Ok(());
        };

        let pushed = tokio::time::timeout(
            self.config.fetch_timeout,
            RemoteStore::<E>::put(remote, &*entity),
        )
        .await
        .unwrap_or_else(|_| {
            Err(Error::Timeout(format!(
                "remote put of {} {}",
                E::KIND,
                entity.id()
            )))
        });

        let status = match pushed {
            Ok(()) => SyncStatus::Synced,
            Err(error) => {
                tracing::warn!(
                    kind = E::KIND,
                    id = %entity.id(),
                    %error,
                    "Remote push failed; queued for sync"
                );
                SyncStatus::Failed
            }
        };

        local.set_sync_status(&entity.id(), entity.updated_at(), status)?;
        entity.sync_metadata_mut().mark(status);
        Ok(())
    }
}
