//! Last-write-wins conflict resolution

use crate::models::SyncableEntity;

/// Which copy of a record becomes authoritative.
///
/// The chosen entity replaces the other wholesale; fields are never merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<E> {
    /// Keep the on-device copy
    UseLocal(E),
    /// Keep the remote store's copy
    UseRemote(E),
}

impl<E> Resolution<E> {
    /// The chosen entity
    pub const fn entity(&self) -> &E {
        match self {
            Self::UseLocal(entity) | Self::UseRemote(entity) => entity,
        }
    }

    /// Consume the resolution, returning the chosen entity
    pub fn into_entity(self) -> E {
        match self {
            Self::UseLocal(entity) | Self::UseRemote(entity) => entity,
        }
    }

    /// Whether the local copy won
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::UseLocal(_))
    }

    /// "local" or "remote"
    pub const fn source(&self) -> &'static str {
        match self {
            Self::UseLocal(_) => "local",
            Self::UseRemote(_) => "remote",
        }
    }
}

/// Decides which of a local and a remote copy of the same record wins.
pub trait ConflictResolver {
    /// `remote` must describe the same logical record as `local` (same id).
    fn resolve<E: SyncableEntity>(&self, local: E, remote: Option<E>) -> Resolution<E>;
}

/// Last-write-wins by `updated_at`.
///
/// A missing remote copy keeps the local one. Equal timestamps keep the
/// remote copy so two replicas with coinciding clocks settle on the same
/// record instead of overwriting each other.
#[derive(Debug, Clone, Copy, Default)]
pub struct LastWriteWins;

impl ConflictResolver for LastWriteWins {
    fn resolve<E: SyncableEntity>(&self, local: E, remote: Option<E>) -> Resolution<E> {
        let Some(remote) = remote else {
            return Resolution::UseLocal(local);
        };
        debug_assert_eq!(local.id(), remote.id(), "resolving copies of different records");

        if local.updated_at() > remote.updated_at() {
            Resolution::UseLocal(local)
        } else {
            Resolution::UseRemote(remote)
        }
    }
}

/// Resolve with the default last-write-wins policy
pub fn resolve<E: SyncableEntity>(local: E, remote: Option<E>) -> Resolution<E> {
    LastWriteWins.resolve(local, remote)
}
