//! Ownership transfer model

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::fowl::FowlId;
use super::sync::{SyncMetadata, SyncableEntity};

/// Free-form evidence attached when a transfer is verified
/// (photo URLs, signatures, attested identity, ...).
pub type VerificationDetails = BTreeMap<String, String>;

/// A unique identifier for a transfer attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferId(Uuid);

impl TransferId {
    /// Create a new unique transfer ID using UUID v7
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

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransferId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Lifecycle status of a transfer attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    /// Created but not yet initiated
    #[default]
    Draft,
    /// Waiting for the receiver to verify or reject
    Pending,
    /// Accepted by the receiver (terminal)
    Verified,
    /// Declined by the receiver (terminal)
    Rejected,
}

impl TransferStatus {
    /// Stable text form used for persistence and messages
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Pending => "PENDING",
            Self::Verified => "VERIFIED",
            Self::Rejected => "REJECTED",
        }
    }

    /// No transition leaves a terminal status
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Verified | Self::Rejected)
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransferStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(Self::Draft),
            "PENDING" => Ok(Self::Pending),
            "VERIFIED" => Ok(Self::Verified),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(format!("unknown transfer status '{other}'")),
        }
    }
}

/// One attempt to move ownership of a fowl from a giver to a receiver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Unique identifier
    pub id: TransferId,
    /// The bird changing hands
    pub fowl_id: FowlId,
    /// Current owner handing the bird over
    pub giver_id: String,
    /// User taking ownership
    pub receiver_id: String,
    /// Lifecycle status, written only by the transfer state machine
    pub status: TransferStatus,
    /// Evidence supplied at verification time
    pub verification_details: VerificationDetails,
    /// Sync bookkeeping
    pub sync: SyncMetadata,
}

impl Transfer {
    /// Draft a new transfer attempt
    #[must_use]
    pub fn new(
        fowl_id: FowlId,
        giver_id: impl Into<String>,
        receiver_id: impl Into<String>,
    ) -> Self {
        Self {
            id: TransferId::new(),
            fowl_id,
            giver_id: giver_id.into(),
            receiver_id: receiver_id.into(),
            status: TransferStatus::Draft,
            verification_details: VerificationDetails::new(),
            sync: SyncMetadata::new(),
        }
    }
}

impl SyncableEntity for Transfer {
    const KIND: &'static str = "transfer";

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
