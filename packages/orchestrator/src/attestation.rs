//! Attestation polling against the external attestation service.
//!
//! After an EVM-origin burn, the attestation service indexes the burn event
//! and eventually serves a signed attestation keyed by (source domain,
//! transaction hash). The indexer may lag the chain, so a 404 or an empty
//! message list reads as "pending", never as an error.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};
use transit_multichain::{ChainError, DomainId};

use crate::error::TransferError;
use crate::poll::{poll_fixed, CancelToken, PollOutcome};

/// Status of an attestation as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttestationStatus {
    /// The service knows the burn but has not attested yet.
    Pending,
    /// Attestation issued; message and attestation bytes are available.
    Complete,
    /// The service does not know the transaction yet (indexer lag);
    /// equivalent to pending.
    NotFound,
}

/// One observation of the attestation service. Superseded by each re-poll,
/// never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationRecord {
    pub status: AttestationStatus,
    /// Raw bridge message bytes.
    pub message: Vec<u8>,
    /// Attestation signature bytes; present only when complete.
    pub attestation: Option<Vec<u8>>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    messages: Vec<IrisMessage>,
}

#[derive(Debug, Deserialize)]
struct IrisMessage {
    #[serde(default)]
    attestation: String,
    #[serde(default)]
    message: String,
}

/// Poller for the attestation service.
pub struct AttestationPoller {
    base_url: String,
    interval: Duration,
    max_attempts: u32,
    client: reqwest::Client,
}

impl AttestationPoller {
    pub fn new(
        base_url: &str,
        interval: Duration,
        max_attempts: u32,
    ) -> Result<Self, ChainError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            interval,
            max_attempts,
            client,
        })
    }

    /// One observation of the service. Transport errors bubble up so the
    /// caller can decide whether they end the poll.
    pub async fn fetch_once(
        &self,
        source_domain: DomainId,
        tx_hash: &str,
    ) -> Result<AttestationRecord, ChainError> {
        let url = format!("{}/v1/messages/{}/{}", self.base_url, source_domain, tx_hash);

        let response = self.client.get(&url).send().await?;

        if response.status().as_u16() == 404 {
            return Ok(AttestationRecord {
                status: AttestationStatus::NotFound,
                message: Vec::new(),
                attestation: None,
            });
        }

        if !response.status().is_success() {
            return Err(ChainError::Rpc(format!(
                "attestation query failed: {}",
                response.status()
            )));
        }

        let body: MessagesResponse = response.json().await?;

        let Some(first) = body.messages.first() else {
            return Ok(AttestationRecord {
                status: AttestationStatus::Pending,
                message: Vec::new(),
                attestation: None,
            });
        };

        let message = decode_hex_field(&first.message)?;

        if first.attestation.is_empty() || first.attestation == "PENDING" {
            return Ok(AttestationRecord {
                status: AttestationStatus::Pending,
                message,
                attestation: None,
            });
        }

        let attestation = decode_hex_field(&first.attestation)?;

        Ok(AttestationRecord {
            status: AttestationStatus::Complete,
            message,
            attestation: Some(attestation),
        })
    }

    /// Poll until the attestation completes, the attempt budget runs out, or
    /// the caller cancels.
    ///
    /// A timeout is an outcome, not an error: the burn receipt stays valid
    /// and the caller may keep waiting out of band or re-enter later.
    pub async fn await_attestation(
        &self,
        source_domain: DomainId,
        tx_hash: &str,
        cancel: &CancelToken,
    ) -> Result<PollOutcome<AttestationRecord>, TransferError> {
        let outcome = poll_fixed(self.interval, self.max_attempts, cancel, |attempt| {
            let tx_hash = tx_hash.to_string();
            async move {
                match self.fetch_once(source_domain, &tx_hash).await {
                    Ok(record) if record.status == AttestationStatus::Complete => {
                        debug!(tx_hash = %tx_hash, attempt, "Attestation complete");
                        Ok(Some(record))
                    }
                    Ok(record) => {
                        debug!(tx_hash = %tx_hash, attempt, status = ?record.status, "Attestation not ready");
                        Ok(None)
                    }
                    // The indexer being flaky is indistinguishable from it
                    // lagging; treat a transport error as a pending tick.
                    Err(ChainError::Http(e)) => {
                        warn!(tx_hash = %tx_hash, attempt, error = %e, "Attestation endpoint unreachable");
                        Ok(None)
                    }
                    Err(ChainError::Rpc(msg)) => {
                        warn!(tx_hash = %tx_hash, attempt, error = %msg, "Attestation endpoint error");
                        Ok(None)
                    }
                    Err(other) => Err(TransferError::Chain(other)),
                }
            }
        })
        .await?;

        Ok(outcome)
    }
}

fn decode_hex_field(value: &str) -> Result<Vec<u8>, ChainError> {
    if value.is_empty() {
        return Ok(Vec::new());
    }
    let stripped = value.strip_prefix("0x").unwrap_or(value);
    Ok(hex::decode(stripped)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_poller(base_url: &str, max_attempts: u32) -> AttestationPoller {
        AttestationPoller::new(base_url, Duration::from_millis(5), max_attempts).unwrap()
    }

    #[tokio::test]
    async fn test_404_reads_as_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/messages/0/0xabc"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let poller = fast_poller(&server.uri(), 3);
        let record = poller.fetch_once(DomainId(0), "0xabc").await.unwrap();
        assert_eq!(record.status, AttestationStatus::NotFound);
    }

    #[tokio::test]
    async fn test_empty_message_list_reads_as_pending() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/messages/0/0xabc"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"messages": []})),
            )
            .mount(&server)
            .await;

        let poller = fast_poller(&server.uri(), 3);
        let record = poller.fetch_once(DomainId(0), "0xabc").await.unwrap();
        assert_eq!(record.status, AttestationStatus::Pending);
    }

    #[tokio::test]
    async fn test_pending_string_is_never_complete() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/messages/0/0xabc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messages": [{"attestation": "PENDING", "message": "0xdeadbeef"}]
            })))
            .mount(&server)
            .await;

        let poller = fast_poller(&server.uri(), 3);
        let record = poller.fetch_once(DomainId(0), "0xabc").await.unwrap();
        assert_eq!(record.status, AttestationStatus::Pending);
        assert_eq!(record.message, vec![0xde, 0xad, 0xbe, 0xef]);
        assert!(record.attestation.is_none());
    }

    #[tokio::test]
    async fn test_completes_on_second_poll() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/messages/4/HASH"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messages": [{"attestation": "PENDING", "message": "0x00"}]
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/messages/4/HASH"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messages": [{"attestation": "0x1234", "message": "0xdeadbeef"}]
            })))
            .mount(&server)
            .await;

        let poller = fast_poller(&server.uri(), 10);
        let (_handle, token) = crate::poll::cancel_pair();

        let outcome = poller
            .await_attestation(DomainId(4), "HASH", &token)
            .await
            .unwrap();

        match outcome {
            PollOutcome::Ready(record) => {
                assert_eq!(record.status, AttestationStatus::Complete);
                assert_eq!(record.attestation, Some(vec![0x12, 0x34]));
            }
            other => panic!("expected ready, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_an_outcome_not_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/messages/0/0xabc"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let poller = fast_poller(&server.uri(), 3);
        let (_handle, token) = crate::poll::cancel_pair();

        let outcome = poller
            .await_attestation(DomainId(0), "0xabc", &token)
            .await
            .unwrap();

        assert!(matches!(outcome, PollOutcome::TimedOut { .. }));
    }

    #[tokio::test]
    async fn test_cancel_resolves_cancelled() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/messages/0/0xabc"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let poller = AttestationPoller::new(&server.uri(), Duration::from_secs(60), 20).unwrap();
        let (handle, token) = crate::poll::cancel_pair();

        handle.cancel();

        let outcome = poller
            .await_attestation(DomainId(0), "0xabc", &token)
            .await
            .unwrap();

        assert_eq!(outcome, PollOutcome::Cancelled);
    }
}
