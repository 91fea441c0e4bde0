//! Typed errors for chain access.
//!
//! The orchestrator classifies failures into its user-facing taxonomy, so
//! this layer keeps transport, signing, simulation, and on-chain rejection
//! distinct instead of flattening everything into one report type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Contract error: {0}")]
    Contract(#[from] alloy::contract::Error),

    #[error("Transaction error: {0}")]
    PendingTransaction(#[from] alloy::providers::PendingTransactionError),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Simulation failed: {0}")]
    Simulation(String),

    /// Transaction was included in a block but rejected by the state machine.
    #[error("Transaction {tx_hash} failed with code {code}: {raw_log}")]
    TxFailed {
        tx_hash: String,
        code: u32,
        raw_log: String,
    },

    #[error("Timed out waiting for transaction {0} to be confirmed")]
    ConfirmationTimeout(String),

    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Invalid hex encoding: {0}")]
    HexDecode(#[from] hex::FromHexError),

    #[error("Message encoding error: {0}")]
    Encoding(String),

    #[error("Unknown domain: {0}")]
    UnknownDomain(String),

    #[error("Malformed response from {endpoint}: {reason}")]
    MalformedResponse { endpoint: String, reason: String },
}

impl ChainError {
    pub fn invalid_address(address: impl Into<String>, reason: impl Into<String>) -> Self {
        ChainError::InvalidAddress {
            address: address.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        ChainError::MalformedResponse {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }
}
