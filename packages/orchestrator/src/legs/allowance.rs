//! EVM allowance leg.

use std::sync::Arc;

use alloy::primitives::U256;
use async_trait::async_trait;
use tracing::info;
use transit_multichain::evm::{EvmConnection, TokenMessengerClient};
use transit_multichain::ChainError;

use crate::error::TransferError;
use crate::legs::AllowanceLeg;

/// Allowance management against the USDC contract on the active EVM chain.
///
/// Owner is the connection's signer; spender is the TokenMessenger.
pub struct EvmAllowanceLeg {
    conn: Arc<EvmConnection>,
}

impl EvmAllowanceLeg {
    pub fn new(conn: Arc<EvmConnection>) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl AllowanceLeg for EvmAllowanceLeg {
    async fn current_allowance(&self) -> Result<u128, TransferError> {
        let client = TokenMessengerClient::new(&self.conn);
        let allowance = client
            .allowance(self.conn.address(), self.conn.token_messenger_address())
            .await
            .map_err(TransferError::Allowance)?;

        // USDC amounts fit comfortably in u128; saturate rather than wrap on
        // a pathological unlimited approval.
        Ok(u128::try_from(allowance).unwrap_or(u128::MAX))
    }

    async fn approve(&self, amount: u128) -> Result<String, TransferError> {
        let client = TokenMessengerClient::new(&self.conn);
        let spender = self.conn.token_messenger_address();

        let tx_hash = client
            .approve(spender, U256::from(amount))
            .await
            .map_err(|e| match e {
                ChainError::Signing(msg) => TransferError::SigningRejected(msg),
                other => TransferError::Allowance(other),
            })?;

        info!(spender = %spender, amount, "Allowance raised");
        Ok(tx_hash)
    }
}
