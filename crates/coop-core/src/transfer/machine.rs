//! Ownership transfer state machine

use tokio::sync::watch;

use crate::error::{Error, Result};
use crate::models::{Transfer, TransferStatus, VerificationDetails};

/// Current state of one transfer attempt.
///
/// The payload's `status` always agrees with the variant.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TransferState {
    /// No transfer in flight
    #[default]
    Idle,
    /// Initiated, waiting for verification or rejection
    Pending(Transfer),
    /// Accepted by the receiver
    Verified(Transfer),
    /// Declined by the receiver
    Rejected(Transfer),
}

impl TransferState {
    /// State matching a persisted transfer's status; drafts map to `Idle`.
    pub fn from_transfer(transfer: Transfer) -> Self {
        match transfer.status {
            TransferStatus::Draft => Self::Idle,
            TransferStatus::Pending => Self::Pending(transfer),
            TransferStatus::Verified => Self::Verified(transfer),
            TransferStatus::Rejected => Self::Rejected(transfer),
        }
    }

    /// The transfer carried by this state, if any
    pub const fn transfer(&self) -> Option<&Transfer> {
        match self {
            Self::Idle => None,
            Self::Pending(transfer) | Self::Verified(transfer) | Self::Rejected(transfer) => {
                Some(transfer)
            }
        }
    }

    /// Consume the state, returning the carried transfer
    pub fn into_transfer(self) -> Option<Transfer> {
        match self {
            Self::Idle => None,
            Self::Pending(transfer) | Self::Verified(transfer) | Self::Rejected(transfer) => {
                Some(transfer)
            }
        }
    }

    /// Upper-case name of the state, matching `TransferStatus` labels
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Pending(_) => "PENDING",
            Self::Verified(_) => "VERIFIED",
            Self::Rejected(_) => "REJECTED",
        }
    }

    /// Whether the attempt has finished (VERIFIED or REJECTED)
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Verified(_) | Self::Rejected(_))
    }
}

/// Guards the lifecycle of a single transfer attempt.
///
/// The current state lives in a watch cell: transitions check and publish
/// under the cell's write lock, and subscribers always see the latest state
/// first. Scope one machine per in-flight transfer.
#[derive(Debug)]
pub struct TransferStateMachine {
    state: watch::Sender<TransferState>,
}

impl TransferStateMachine {
    /// Machine starting from `Idle`
    pub fn new() -> Self {
        let (state, _) = watch::channel(TransferState::Idle);
        Self { state }
    }

    /// Machine resuming a persisted transfer
    pub fn resume(transfer: Transfer) -> Self {
        let (state, _) = watch::channel(TransferState::from_transfer(transfer));
        Self { state }
    }

    /// Snapshot of the current state
    pub fn current(&self) -> TransferState {
        self.state.borrow().clone()
    }

    /// Observe the current state and every later transition
    pub fn subscribe(&self) -> watch::Receiver<TransferState> {
        self.state.subscribe()
    }

    /// Start the attempt: the transfer becomes PENDING.
    ///
    /// Refused when the transfer, or the machine's record of it, already
    /// reached VERIFIED or REJECTED.
    pub fn initiate_transfer(&self, mut transfer: Transfer) -> Result<TransferState> {
        if transfer.status.is_terminal() {
            return Err(Error::InvalidTransition(format!(
                "transfer {} is already {}; start a new transfer instead",
                transfer.id, transfer.status
            )));
        }
        validate_parties(&transfer)?;

        let id = transfer.id;
        transfer.status = TransferStatus::Pending;
        transfer.sync.touch();
        let next = TransferState::Pending(transfer);
        let mut outcome = None;

        self.state.send_if_modified(|state| {
            if state.is_terminal() && state.transfer().is_some_and(|held| held.id == id) {
                outcome = Some(Err(Error::InvalidTransition(format!(
                    "transfer {id} is already {}; start a new transfer instead",
                    state.label()
                ))));
                return false;
            }
            *state = next.clone();
            outcome = Some(Ok(next.clone()));
            true
        });

        let outcome = outcome.unwrap_or_else(|| {
            Err(Error::Internal(format!(
                "initiate of transfer {id} did not run"
            )))
        });
        match &outcome {
            Ok(_) => tracing::debug!(transfer_id = %id, "Transfer initiated"),
            Err(error) => {
                tracing::debug!(transfer_id = %id, %error, "Transfer initiation refused");
            }
        }
        outcome
    }

    /// Accept the pending transfer, attaching `details` as evidence.
    pub fn verify_transfer(
        &self,
        transfer: &Transfer,
        details: VerificationDetails,
    ) -> Result<TransferState> {
        self.complete(transfer, "verify", move |mut pending| {
            pending.status = TransferStatus::Verified;
            pending.verification_details = details;
            pending.sync.touch();
            TransferState::Verified(pending)
        })
    }

    /// Decline the pending transfer.
    pub fn reject_transfer(&self, transfer: &Transfer) -> Result<TransferState> {
        self.complete(transfer, "reject", |mut pending| {
            pending.status = TransferStatus::Rejected;
            pending.sync.touch();
            TransferState::Rejected(pending)
        })
    }

    /// Drop whatever attempt is tracked and return to `Idle`
    pub fn reset(&self) {
        self.state.send_replace(TransferState::Idle);
        tracing::debug!("Transfer state machine reset");
    }

    /// Move `Pending(transfer)` to the state built by `apply`.
    ///
    /// Both the given transfer and the tracked one must be PENDING with the
    /// same id; otherwise the published state is left untouched.
    fn complete<F>(&self, transfer: &Transfer, action: &str, apply: F) -> Result<TransferState>
    where
        F: FnOnce(Transfer) -> TransferState,
    {
        let mut outcome = None;

        self.state.send_if_modified(|state| {
            match std::mem::take(state) {
                TransferState::Pending(pending)
                    if pending.id == transfer.id && transfer.status == TransferStatus::Pending =>
                {
                    let next = apply(pending);
                    *state = next.clone();
                    outcome = Some(Ok(next));
                    true
                }
                previous => {
                    outcome = Some(Err(invalid_transition(transfer, action, &previous)));
                    *state = previous;
                    false
                }
            }
        });

        let outcome = outcome.unwrap_or_else(|| {
            Err(Error::Internal(format!(
                "{action} of transfer {} did not run",
                transfer.id
            )))
        });
        match &outcome {
            Ok(next) => {
                tracing::debug!(transfer_id = %transfer.id, state = next.label(), "Transfer completed");
            }
            Err(error) => {
                tracing::debug!(transfer_id = %transfer.id, %error, "Transfer transition refused");
            }
        }
        outcome
    }
}

impl Default for TransferStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_parties(transfer: &Transfer) -> Result<()> {
    if transfer.giver_id.trim().is_empty() || transfer.receiver_id.trim().is_empty() {
        return Err(Error::InvalidInput(
            "transfer giver and receiver must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn invalid_transition(transfer: &Transfer, action: &str, current: &TransferState) -> Error {
    let found = if transfer.status == TransferStatus::Pending {
        match current {
            TransferState::Pending(other) => format!("PENDING for transfer {}", other.id),
            other => other.label().to_string(),
        }
    } else {
        transfer.status.to_string()
    };

    Error::InvalidTransition(format!(
        "transfer {} must be PENDING to {action}, but is {found}",
        transfer.id
    ))
}
