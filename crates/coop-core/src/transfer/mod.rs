//! Ownership transfers between users

mod machine;
mod service;

pub use machine::{TransferState, TransferStateMachine};
pub use service::TransferService;
