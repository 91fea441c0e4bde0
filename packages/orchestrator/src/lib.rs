//! Transit orchestrator: the cross-domain USDC transfer state machine.
//!
//! Drives a transfer from source-domain submission through attestation,
//! relayed mint on the hub chain, and the optional IBC hop to the secondary
//! chain. Each leg is a trait so callers (and tests) can inject their own
//! implementations; production legs wrap the `transit-multichain` clients.
//!
//! - [`transfer::Orchestrator`] - the state machine itself
//! - [`legs`] - one trait per component contract, plus production impls
//! - [`attestation`] / [`watcher`] - the polling components
//! - [`fees`] / [`backend`] - route table and backend integration
//! - [`poll`] - the shared cancellable poll primitive

pub mod attestation;
pub mod backend;
pub mod config;
pub mod error;
pub mod events;
pub mod fees;
pub mod legs;
pub mod poll;
pub mod transfer;
pub mod watcher;

pub use attestation::{AttestationRecord, AttestationStatus};
pub use error::{PollTarget, TransferError};
pub use events::TransferEvent;
pub use poll::{cancel_pair, CancelHandle, CancelToken, PollOutcome};
pub use transfer::{
    BurnReceipt, CompletedTransfer, Orchestrator, RelayResult, TransferFailure, TransferPhase,
    TransferRequest,
};
