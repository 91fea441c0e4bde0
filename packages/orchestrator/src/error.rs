//! Transfer error taxonomy.
//!
//! The variants preserve the distinction that matters most to a user of a
//! non-atomic bridge: whether anything happened on chain. `Validation`,
//! `Simulation`, and a `Submission` that never broadcast mean nothing moved;
//! `LogicalRejection` and `PollTimeout` after a burn mean value is in flight
//! and the retained receipt is the recovery handle.

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use transit_multichain::ChainError;

/// What a timed-out poll was waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollTarget {
    Attestation,
    BalanceChange,
}

impl fmt::Display for PollTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollTarget::Attestation => f.write_str("attestation"),
            PollTarget::BalanceChange => f.write_str("balance change"),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransferError {
    /// Bad input; fix and resubmit. Never retried as-is.
    #[error("validation error: {0}")]
    Validation(String),

    /// The signer declined. Terminal for this attempt.
    #[error("signing rejected: {0}")]
    SigningRejected(String),

    /// RPC/broadcast failure. Not retried automatically: resubmission of a
    /// burn is asset-affecting, so the caller must explicitly re-invoke.
    #[error("submission failed: {0}")]
    Submission(#[source] ChainError),

    /// Pre-flight simulation failed; nothing was broadcast. Safe to retry.
    #[error("simulation failed: {0}")]
    Simulation(#[source] ChainError),

    /// The transaction was included but rejected by the destination's state
    /// machine. Terminal; requires investigation, never silently retried.
    #[error("transaction {tx_hash} included but rejected (code {code}): {raw_log}")]
    LogicalRejection {
        tx_hash: String,
        code: u32,
        raw_log: String,
    },

    /// Approval check or submission failed. Approvals are never retried
    /// automatically (a stale amount could double-approve).
    #[error("allowance step failed: {0}")]
    Allowance(#[source] ChainError),

    /// A poll exceeded its budget. Recoverable: re-poll with the retained
    /// burn receipt or address.
    #[error("timed out after {waited:?} waiting for {target}")]
    PollTimeout { target: PollTarget, waited: Duration },

    /// Caller-initiated abort of an in-flight poll.
    #[error("cancelled")]
    Cancelled,

    /// The IBC forward was skipped: reserving the relay-fee buffer leaves
    /// nothing to send.
    #[error("insufficient hub balance: {available} available, {reserve} reserved")]
    InsufficientBalance { available: u128, reserve: u128 },

    /// Transport-level chain access failure outside a submission.
    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl TransferError {
    /// Classify a chain error raised while submitting a transaction.
    pub fn from_submission(err: ChainError) -> Self {
        match err {
            ChainError::Simulation(_) => TransferError::Simulation(err),
            ChainError::Signing(msg) => TransferError::SigningRejected(msg),
            ChainError::TxFailed {
                tx_hash,
                code,
                raw_log,
            } => TransferError::LogicalRejection {
                tx_hash,
                code,
                raw_log,
            },
            other => TransferError::Submission(other),
        }
    }

    /// True when retrying the same call cannot double-spend (nothing was
    /// broadcast, or the failure was read-only).
    pub fn is_safe_to_retry(&self) -> bool {
        matches!(
            self,
            TransferError::Validation(_)
                | TransferError::Simulation(_)
                | TransferError::PollTimeout { .. }
                | TransferError::Cancelled
        )
    }
}
