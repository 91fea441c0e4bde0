//! Burn submission legs.
//!
//! The EVM variant calls the TokenMessenger's deposit-for-burn entry point;
//! the Cosmos variant composes the hub module message and broadcasts it
//! together with the route fee payment in a single atomic transaction.
//! Neither retries: a duplicate burn submission risks a double spend from
//! the user's perspective, so failed submissions are re-invoked explicitly
//! by the caller.

use std::sync::Arc;

use alloy::primitives::U256;
use async_trait::async_trait;
use chrono::Utc;
use cosmrs::{bank::MsgSend, tx::Msg, Coin};
use tracing::{info, warn};
use transit_multichain::evm::{EvmConnection, TokenMessengerClient};
use transit_multichain::noble::{proto::MsgDepositForBurn, NobleClient};
use transit_multichain::{ChainError, DomainId};

use crate::error::TransferError;
use crate::fees::RouteTable;
use crate::legs::BurnLeg;
use crate::transfer::{BurnReceipt, TransferRequest};

/// Deposit-for-burn via the EVM TokenMessenger contract.
pub struct EvmBurnLeg {
    conn: Arc<EvmConnection>,
}

impl EvmBurnLeg {
    pub fn new(conn: Arc<EvmConnection>) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl BurnLeg for EvmBurnLeg {
    async fn submit_burn(
        &self,
        request: &TransferRequest,
        destination: DomainId,
        mint_recipient: [u8; 32],
    ) -> Result<BurnReceipt, TransferError> {
        let client = TokenMessengerClient::new(&self.conn);

        let tx_hash = client
            .deposit_for_burn(U256::from(request.amount), destination, mint_recipient)
            .await
            .map_err(TransferError::from_submission)?;

        Ok(BurnReceipt {
            source: request.source,
            tx_hash,
            created_at: Utc::now(),
        })
    }
}

/// Deposit-for-burn via the hub chain's bridge module.
///
/// The route-table fee travels as a companion bank send to the fee
/// collector in the same transaction, so fee and burn succeed or fail
/// together. A missing fee entry (or missing collector address) drops the
/// fee message entirely rather than sending zero coins.
pub struct NobleBurnLeg {
    client: Arc<NobleClient>,
    routes: Arc<RouteTable>,
}

impl NobleBurnLeg {
    pub fn new(client: Arc<NobleClient>, routes: Arc<RouteTable>) -> Self {
        Self { client, routes }
    }

    /// Messages for the burn transaction, fee payment first.
    fn compose_messages(
        &self,
        request: &TransferRequest,
        destination: DomainId,
        mint_recipient: [u8; 32],
    ) -> Result<Vec<cosmrs::Any>, TransferError> {
        let from = self.client.address();
        let mut msgs = Vec::with_capacity(2);

        let route = self.routes.fee_and_eta(request.target);
        match (route.fee, self.routes.minter()) {
            (fee, Some(minter)) if fee > 0 => {
                let fee_msg = MsgSend {
                    from_address: from.parse().map_err(|e| {
                        TransferError::Validation(format!("bad sender address: {}", e))
                    })?,
                    to_address: minter.parse().map_err(|e| {
                        TransferError::Validation(format!("bad fee collector address: {}", e))
                    })?,
                    amount: vec![Coin {
                        denom: self.client.fee_denom().parse().map_err(|e| {
                            TransferError::Validation(format!("bad fee denom: {:?}", e))
                        })?,
                        amount: fee,
                    }],
                };
                msgs.push(fee_msg.to_any().map_err(|e| {
                    TransferError::Chain(ChainError::Encoding(format!(
                        "fee message encoding failed: {}",
                        e
                    )))
                })?);
            }
            _ => {
                warn!(target = %request.target, "No usable fee route, burning without fee payment");
            }
        }

        let burn_msg = MsgDepositForBurn {
            from,
            amount: request.amount.to_string(),
            destination_domain: destination.0,
            mint_recipient: mint_recipient.to_vec(),
            burn_token: self.client.fee_denom().to_string(),
        };
        msgs.push(burn_msg.to_any());

        Ok(msgs)
    }
}

#[async_trait]
impl BurnLeg for NobleBurnLeg {
    async fn submit_burn(
        &self,
        request: &TransferRequest,
        destination: DomainId,
        mint_recipient: [u8; 32],
    ) -> Result<BurnReceipt, TransferError> {
        let msgs = self.compose_messages(request, destination, mint_recipient)?;

        let outcome = self
            .client
            .sign_and_broadcast(&msgs)
            .await
            .map_err(TransferError::from_submission)?;

        if !outcome.is_success() {
            return Err(TransferError::LogicalRejection {
                tx_hash: outcome.tx_hash,
                code: outcome.code,
                raw_log: outcome.raw_log,
            });
        }

        info!(tx_hash = %outcome.tx_hash, destination = %destination, "Burn confirmed on hub");

        Ok(BurnReceipt {
            source: request.source,
            tx_hash: outcome.tx_hash,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transit_multichain::encode_mint_recipient;
    use transit_multichain::noble::{proto, MnemonicSigner, NobleClientConfig};
    use transit_multichain::Domain;

    const TEST_MNEMONIC: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn noble_leg(routes: RouteTable) -> NobleBurnLeg {
        let signer = MnemonicSigner::new(TEST_MNEMONIC, "noble").unwrap();
        let client =
            NobleClient::new(NobleClientConfig::default(), Box::new(signer)).unwrap();
        NobleBurnLeg::new(Arc::new(client), Arc::new(routes))
    }

    fn eth_request() -> TransferRequest {
        TransferRequest {
            source: Domain::Noble,
            target: Domain::Ethereum,
            recipient: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string(),
            amount: 1_000_000,
        }
    }

    fn routed_table() -> RouteTable {
        serde_json::from_value(serde_json::json!({
            "minter": "noble1k74p0mrdm2a94u7kqpcrfv5lxwnd5wh6uruqln",
            "targetChains": [
                {"chainName": "Ethereum", "fee": "150000", "time": "~15 minutes", "domain": 0}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_fee_message_precedes_burn() {
        let leg = noble_leg(routed_table());
        let request = eth_request();
        let recipient = encode_mint_recipient(&request.recipient).unwrap();

        let msgs = leg
            .compose_messages(&request, DomainId(0), recipient)
            .unwrap();

        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].type_url, "/cosmos.bank.v1beta1.MsgSend");
        assert_eq!(msgs[1].type_url, proto::MSG_DEPOSIT_FOR_BURN_TYPE_URL);
    }

    #[test]
    fn test_missing_route_drops_fee_message() {
        let leg = noble_leg(RouteTable::default());
        let request = eth_request();
        let recipient = encode_mint_recipient(&request.recipient).unwrap();

        let msgs = leg
            .compose_messages(&request, DomainId(0), recipient)
            .unwrap();

        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].type_url, proto::MSG_DEPOSIT_FOR_BURN_TYPE_URL);
    }

    #[test]
    fn test_burn_message_carries_canonical_recipient() {
        use prost::Message as _;

        let leg = noble_leg(RouteTable::default());
        let request = eth_request();
        let recipient = encode_mint_recipient(&request.recipient).unwrap();

        let msgs = leg
            .compose_messages(&request, DomainId(0), recipient)
            .unwrap();

        let decoded =
            proto::MsgDepositForBurn::decode(msgs[0].value.as_slice()).unwrap();
        assert_eq!(decoded.mint_recipient.len(), 32);
        assert_eq!(decoded.mint_recipient, recipient.to_vec());
        assert_eq!(decoded.destination_domain, 0);
        assert_eq!(decoded.amount, "1000000");
        assert_eq!(decoded.burn_token, "uusdc");
    }
}
