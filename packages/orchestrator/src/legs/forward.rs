//! IBC forward leg: the hub-to-secondary-chain hop.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};
use transit_multichain::noble::{
    proto::{Coin, MsgIbcTransfer},
    NobleClient,
};

use crate::error::TransferError;
use crate::legs::{ForwardLeg, ForwardOutcome};
use crate::transfer::{RelayResult, TransferRequest};

/// IBC source port, fixed by the transfer application.
const IBC_SOURCE_PORT: &str = "transfer";

/// Configuration of the hub-to-secondary hop.
#[derive(Debug, Clone)]
pub struct ForwardConfig {
    /// IBC channel from the hub to the secondary chain.
    pub channel: String,
    /// Base units left behind to cover the hub's own relay fees.
    pub reserve: u128,
    /// Packet timeout window from now.
    pub timeout: Duration,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            channel: "channel-81".to_string(),
            reserve: 50_000,
            timeout: Duration::from_secs(10 * 60),
        }
    }
}

/// Amount that can actually be forwarded, if any.
///
/// `min(desired, available - reserve)`; `None` when reserving the buffer
/// leaves nothing to send.
pub fn sendable_amount(desired: u128, available: u128, reserve: u128) -> Option<u128> {
    let spendable = available.saturating_sub(reserve);
    let amount = desired.min(spendable);
    (amount > 0).then_some(amount)
}

/// Forwards hub funds to the secondary chain over IBC,
/// simulate-then-broadcast.
pub struct NobleForwardLeg {
    client: Arc<NobleClient>,
    config: ForwardConfig,
}

impl NobleForwardLeg {
    pub fn new(client: Arc<NobleClient>, config: ForwardConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl ForwardLeg for NobleForwardLeg {
    async fn forward(
        &self,
        request: &TransferRequest,
        available: u128,
    ) -> Result<ForwardOutcome, TransferError> {
        let Some(amount) = sendable_amount(request.amount, available, self.config.reserve) else {
            warn!(
                available,
                reserve = self.config.reserve,
                desired = request.amount,
                "Skipping IBC forward: nothing sendable after reserve"
            );
            return Ok(ForwardOutcome::InsufficientBalance {
                available,
                reserve: self.config.reserve,
            });
        };

        let deadline = Utc::now()
            + chrono::Duration::from_std(self.config.timeout)
                .unwrap_or_else(|_| chrono::Duration::seconds(600));
        let timeout_timestamp = deadline.timestamp_nanos_opt().unwrap_or(i64::MAX) as u64;

        let msg = MsgIbcTransfer {
            source_port: IBC_SOURCE_PORT.to_string(),
            source_channel: self.config.channel.clone(),
            token: Some(Coin {
                denom: self.client.fee_denom().to_string(),
                amount: amount.to_string(),
            }),
            sender: self.client.address(),
            receiver: request.recipient.clone(),
            timeout_height: None,
            timeout_timestamp,
            memo: String::new(),
        };

        let outcome = self
            .client
            .sign_and_broadcast(&[msg.to_any()])
            .await
            .map_err(TransferError::from_submission)?;

        if !outcome.is_success() {
            return Err(TransferError::LogicalRejection {
                tx_hash: outcome.tx_hash,
                code: outcome.code,
                raw_log: outcome.raw_log,
            });
        }

        info!(
            tx_hash = %outcome.tx_hash,
            amount,
            channel = %self.config.channel,
            receiver = %request.recipient,
            "IBC forward broadcast"
        );

        Ok(ForwardOutcome::Sent(RelayResult {
            tx_hash: outcome.tx_hash,
            code: outcome.code,
            raw_log: outcome.raw_log,
        }))
    }
}
