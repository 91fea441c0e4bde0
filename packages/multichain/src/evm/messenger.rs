//! Allowance and burn calls against the CCTP TokenMessenger.

use alloy::primitives::{Address, FixedBytes, U256};
use tracing::{debug, info};

use crate::error::ChainError;
use crate::evm::client::EvmConnection;
use crate::evm::contracts::{Erc20, TokenMessenger};
use crate::types::DomainId;

/// Typed call surface over one EVM connection's USDC + TokenMessenger pair.
pub struct TokenMessengerClient<'a> {
    conn: &'a EvmConnection,
}

impl<'a> TokenMessengerClient<'a> {
    pub fn new(conn: &'a EvmConnection) -> Self {
        Self { conn }
    }

    /// Current USDC allowance granted by `owner` to `spender`.
    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<U256, ChainError> {
        let token = Erc20::new(self.conn.usdc_address(), self.conn.provider());
        let result = token.allowance(owner, spender).call().await?;

        debug!(owner = %owner, spender = %spender, allowance = %result._0, "Queried allowance");
        Ok(result._0)
    }

    /// Approve `spender` for `amount` and wait for the receipt.
    ///
    /// Returns the approval transaction hash. A revert surfaces as a
    /// transaction error; it is the caller's decision whether to resubmit.
    pub async fn approve(&self, spender: Address, amount: U256) -> Result<String, ChainError> {
        let token = Erc20::new(self.conn.usdc_address(), self.conn.provider());

        let receipt = token
            .approve(spender, amount)
            .send()
            .await?
            .get_receipt()
            .await?;

        let tx_hash = format!("{:#x}", receipt.transaction_hash);

        if !receipt.status() {
            return Err(ChainError::TxFailed {
                tx_hash,
                code: 1,
                raw_log: "approve reverted".to_string(),
            });
        }

        info!(spender = %spender, amount = %amount, tx_hash = %tx_hash, "Approval confirmed");
        Ok(tx_hash)
    }

    /// Burn `amount` USDC toward `mint_recipient` on `destination_domain`,
    /// waiting for the burn transaction to be included.
    pub async fn deposit_for_burn(
        &self,
        amount: U256,
        destination_domain: DomainId,
        mint_recipient: [u8; 32],
    ) -> Result<String, ChainError> {
        let messenger = TokenMessenger::new(
            self.conn.token_messenger_address(),
            self.conn.provider(),
        );

        let receipt = messenger
            .depositForBurn(
                amount,
                destination_domain.0,
                FixedBytes::<32>::from(mint_recipient),
                self.conn.usdc_address(),
            )
            .send()
            .await?
            .get_receipt()
            .await?;

        let tx_hash = format!("{:#x}", receipt.transaction_hash);

        if !receipt.status() {
            return Err(ChainError::TxFailed {
                tx_hash,
                code: 1,
                raw_log: "depositForBurn reverted".to_string(),
            });
        }

        info!(
            amount = %amount,
            destination_domain = %destination_domain,
            tx_hash = %tx_hash,
            "Burn confirmed on source chain"
        );
        Ok(tx_hash)
    }
}
