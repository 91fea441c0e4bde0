//! Mint relay leg: broadcast the attested message on the hub chain.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use transit_multichain::noble::{proto::MsgReceiveMessage, NobleClient};

use crate::attestation::{AttestationRecord, AttestationStatus};
use crate::error::TransferError;
use crate::legs::RelayLeg;
use crate::transfer::RelayResult;

/// Relays an attested burn message to the hub via `MsgReceiveMessage`,
/// simulate-then-broadcast. Simulation failure aborts before any broadcast;
/// a non-zero result code from a landed transaction is a logical failure,
/// distinct from transport errors.
pub struct NobleRelayLeg {
    client: Arc<NobleClient>,
}

impl NobleRelayLeg {
    pub fn new(client: Arc<NobleClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RelayLeg for NobleRelayLeg {
    async fn relay(&self, record: &AttestationRecord) -> Result<RelayResult, TransferError> {
        if record.status != AttestationStatus::Complete {
            return Err(TransferError::Validation(
                "cannot relay without a complete attestation".to_string(),
            ));
        }
        let Some(attestation) = record.attestation.as_ref() else {
            return Err(TransferError::Validation(
                "attestation record has no signature bytes".to_string(),
            ));
        };

        let msg = MsgReceiveMessage {
            from: self.client.address(),
            message: record.message.clone(),
            attestation: attestation.clone(),
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

        info!(tx_hash = %outcome.tx_hash, "Mint relayed on hub");

        Ok(RelayResult {
            tx_hash: outcome.tx_hash,
            code: outcome.code,
            raw_log: outcome.raw_log,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transit_multichain::noble::{MnemonicSigner, NobleClientConfig};
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_MNEMONIC: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn relay_leg(lcd_url: String) -> NobleRelayLeg {
        let signer = MnemonicSigner::new(TEST_MNEMONIC, "noble").unwrap();
        let client = NobleClient::new(
            NobleClientConfig {
                lcd_url,
                ..NobleClientConfig::default()
            },
            Box::new(signer),
        )
        .unwrap();
        NobleRelayLeg::new(Arc::new(client))
    }

    fn complete_record() -> AttestationRecord {
        AttestationRecord {
            status: AttestationStatus::Complete,
            message: vec![0xde, 0xad],
            attestation: Some(vec![0x12, 0x34]),
        }
    }

    async fn mount_account(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path_regex(r"^/cosmos/auth/v1beta1/accounts/.*$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "account": {"sequence": "1", "account_number": "9"}
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_pending_record_is_rejected_without_broadcast() {
        let leg = relay_leg("http://127.0.0.1:1".to_string());
        let record = AttestationRecord {
            status: AttestationStatus::Pending,
            message: vec![],
            attestation: None,
        };

        let result = leg.relay(&record).await;
        assert!(matches!(result, Err(TransferError::Validation(_))));
    }

    #[tokio::test]
    async fn test_simulation_failure_blocks_broadcast_then_retry_succeeds() {
        let server = MockServer::start().await;
        mount_account(&server).await;

        // First simulation attempt fails; the retry sees a healthy endpoint.
        Mock::given(method("POST"))
            .and(path("/cosmos/tx/v1beta1/simulate"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "code": 3, "message": "account sequence mismatch"
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/cosmos/tx/v1beta1/simulate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "gas_info": {"gas_wanted": "200000", "gas_used": "120000"}
            })))
            .mount(&server)
            .await;

        // Exactly one broadcast across both attempts.
        Mock::given(method("POST"))
            .and(path("/cosmos/tx/v1beta1/txs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tx_response": {"txhash": "RELAYED", "code": 0, "raw_log": ""}
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/cosmos/tx/v1beta1/txs/RELAYED"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tx_response": {"txhash": "RELAYED", "code": 0, "raw_log": "", "height": "100"}
            })))
            .mount(&server)
            .await;

        let leg = relay_leg(server.uri());
        let record = complete_record();

        let first = leg.relay(&record).await;
        assert!(matches!(first, Err(TransferError::Simulation(_))));

        let second = leg.relay(&record).await.unwrap();
        assert_eq!(second.tx_hash, "RELAYED");
        assert_eq!(second.code, 0);
    }

    #[tokio::test]
    async fn test_nonzero_code_is_logical_rejection() {
        let server = MockServer::start().await;
        mount_account(&server).await;

        Mock::given(method("POST"))
            .and(path("/cosmos/tx/v1beta1/simulate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "gas_info": {"gas_used": "120000"}
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/cosmos/tx/v1beta1/txs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tx_response": {
                    "txhash": "CONSUMED",
                    "code": 8,
                    "raw_log": "attestation already consumed"
                }
            })))
            .mount(&server)
            .await;

        let leg = relay_leg(server.uri());
        let result = leg.relay(&complete_record()).await;

        match result {
            Err(TransferError::LogicalRejection { code, raw_log, .. }) => {
                assert_eq!(code, 8);
                assert!(raw_log.contains("already consumed"));
            }
            other => panic!("expected logical rejection, got {:?}", other),
        }
    }
}
