//! Component contracts for the transfer legs.
//!
//! One trait per component so the state machine can be exercised with
//! injected failures; production implementations wrap the multichain
//! clients.

pub mod allowance;
pub mod burn;
pub mod forward;
pub mod relay;

use async_trait::async_trait;
use transit_multichain::DomainId;

use crate::attestation::AttestationRecord;
use crate::error::TransferError;
use crate::poll::{CancelToken, PollOutcome};
use crate::transfer::{BurnReceipt, RelayResult, TransferRequest};
use crate::watcher::Direction;

pub use allowance::EvmAllowanceLeg;
pub use burn::{EvmBurnLeg, NobleBurnLeg};
pub use forward::{sendable_amount, NobleForwardLeg};
pub use relay::NobleRelayLeg;

/// Allowance management on the EVM source domain.
#[async_trait]
pub trait AllowanceLeg: Send + Sync {
    /// Current allowance granted to the bridge spender.
    async fn current_allowance(&self) -> Result<u128, TransferError>;

    /// Raise the spender allowance to `amount`. One on-chain transaction;
    /// never retried automatically.
    async fn approve(&self, amount: u128) -> Result<String, TransferError>;
}

/// Deposit-for-burn submission on the source domain.
#[async_trait]
pub trait BurnLeg: Send + Sync {
    /// Submit the burn and return the receipt once it is included.
    ///
    /// `destination` is the bridge domain the mint targets and
    /// `mint_recipient` the canonical 32-byte recipient encoding.
    async fn submit_burn(
        &self,
        request: &TransferRequest,
        destination: DomainId,
        mint_recipient: [u8; 32],
    ) -> Result<BurnReceipt, TransferError>;
}

/// Attestation wait for an EVM-origin burn.
#[async_trait]
pub trait AttestationLeg: Send + Sync {
    async fn await_attestation(
        &self,
        source_domain: DomainId,
        tx_hash: &str,
        cancel: &CancelToken,
    ) -> Result<PollOutcome<AttestationRecord>, TransferError>;
}

/// Broadcast of the attested message on the hub chain.
#[async_trait]
pub trait RelayLeg: Send + Sync {
    async fn relay(&self, record: &AttestationRecord) -> Result<RelayResult, TransferError>;
}

/// Balance-change wait on the hub chain.
#[async_trait]
pub trait BalanceWatchLeg: Send + Sync {
    async fn await_change(
        &self,
        address: &str,
        denom: &str,
        direction: Direction,
        cancel: &CancelToken,
    ) -> Result<PollOutcome<u128>, TransferError>;
}

/// Outcome of an IBC forward attempt.
#[derive(Debug, Clone)]
pub enum ForwardOutcome {
    Sent(RelayResult),
    /// Skipped: reserving the relay-fee buffer leaves nothing to send.
    InsufficientBalance { available: u128, reserve: u128 },
}

/// IBC hop from the hub to the secondary chain.
#[async_trait]
pub trait ForwardLeg: Send + Sync {
    /// Forward up to `request.amount` out of `available` hub balance.
    async fn forward(
        &self,
        request: &TransferRequest,
        available: u128,
    ) -> Result<ForwardOutcome, TransferError>;
}

#[async_trait]
impl AttestationLeg for crate::attestation::AttestationPoller {
    async fn await_attestation(
        &self,
        source_domain: DomainId,
        tx_hash: &str,
        cancel: &CancelToken,
    ) -> Result<PollOutcome<AttestationRecord>, TransferError> {
        crate::attestation::AttestationPoller::await_attestation(self, source_domain, tx_hash, cancel)
            .await
    }
}

#[async_trait]
impl BalanceWatchLeg for crate::watcher::BalanceWatcher {
    async fn await_change(
        &self,
        address: &str,
        denom: &str,
        direction: Direction,
        cancel: &CancelToken,
    ) -> Result<PollOutcome<u128>, TransferError> {
        crate::watcher::BalanceWatcher::await_change(self, address, denom, direction, cancel).await
    }
}
