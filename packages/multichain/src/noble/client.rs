//! Noble LCD client for transaction signing and broadcasting.
//!
//! Implements transaction signing with cosmrs and all chain interaction over
//! the LCD REST API: account info, gas simulation, broadcast, confirmation
//! polling, and bank balance queries.

use std::time::{Duration, Instant};

use base64::Engine as _;
use cosmrs::{
    tx::{self, Fee, SignDoc, SignerInfo},
    Any, Coin,
};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::ChainError;
use crate::noble::signer::CosmosSigner;
use crate::types::BroadcastOutcome;

/// Configuration for the hub chain client.
#[derive(Debug, Clone)]
pub struct NobleClientConfig {
    /// LCD REST endpoint (e.g. "https://lcd-noble.keplr.app")
    pub lcd_url: String,
    /// Chain ID (e.g. "noble-1")
    pub chain_id: String,
    /// Fee denom, the bridged asset itself
    pub fee_denom: String,
    /// Fixed gas price in `fee_denom` per gas unit
    pub gas_price: f64,
    /// Safety multiplier applied to the simulated gas estimate
    pub gas_multiplier: u64,
}

impl Default for NobleClientConfig {
    fn default() -> Self {
        Self {
            lcd_url: "https://lcd-noble.keplr.app".to_string(),
            chain_id: "noble-1".to_string(),
            fee_denom: crate::types::UUSDC.to_string(),
            gas_price: 0.1,
            gas_multiplier: 2,
        }
    }
}

/// Account info from the LCD auth endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountInfo {
    pub sequence: u64,
    pub account_number: u64,
}

/// Gas placeholder used when signing a simulation-only transaction.
const SIMULATION_GAS_PLACEHOLDER: u64 = 200_000;

/// Hub chain client holding an injected signer capability.
pub struct NobleClient {
    config: NobleClientConfig,
    signer: Box<dyn CosmosSigner>,
    client: reqwest::Client,
}

impl NobleClient {
    pub fn new(config: NobleClientConfig, signer: Box<dyn CosmosSigner>) -> Result<Self, ChainError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        info!(
            lcd_url = %config.lcd_url,
            chain_id = %config.chain_id,
            address = %signer.account_id(),
            "Noble client initialized"
        );

        Ok(Self {
            config,
            signer,
            client,
        })
    }

    /// Signer's bech32 address on the hub chain.
    pub fn address(&self) -> String {
        self.signer.account_id().to_string()
    }

    pub fn chain_id(&self) -> &str {
        &self.config.chain_id
    }

    pub fn fee_denom(&self) -> &str {
        &self.config.fee_denom
    }

    fn lcd_url(&self) -> &str {
        self.config.lcd_url.trim_end_matches('/')
    }

    /// Get account info (sequence and account number) for the signer.
    pub async fn account_info(&self) -> Result<AccountInfo, ChainError> {
        let url = format!(
            "{}/cosmos/auth/v1beta1/accounts/{}",
            self.lcd_url(),
            self.signer.account_id()
        );

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(ChainError::Rpc(format!(
                "account query failed: {} - {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let data: serde_json::Value = response.json().await?;

        let account = data
            .get("account")
            .ok_or_else(|| ChainError::malformed(&url, "missing 'account' field"))?;

        // Base accounts carry the fields directly; vesting/module accounts
        // nest them under base_account.
        let sequence = account
            .get("sequence")
            .or_else(|| account.get("base_account").and_then(|b| b.get("sequence")))
            .and_then(|v| v.as_str())
            .unwrap_or("0")
            .parse()
            .unwrap_or(0);

        let account_number = account
            .get("account_number")
            .or_else(|| {
                account
                    .get("base_account")
                    .and_then(|b| b.get("account_number"))
            })
            .and_then(|v| v.as_str())
            .unwrap_or("0")
            .parse()
            .unwrap_or(0);

        Ok(AccountInfo {
            sequence,
            account_number,
        })
    }

    /// Balance of `denom` held by `address`; an absent entry reads as zero.
    pub async fn balance(&self, address: &str, denom: &str) -> Result<u128, ChainError> {
        let url = format!(
            "{}/cosmos/bank/v1beta1/balances/{}",
            self.lcd_url(),
            address
        );

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(ChainError::Rpc(format!(
                "balance query failed: {} - {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let data: serde_json::Value = response.json().await?;

        let amount = data
            .get("balances")
            .and_then(|b| b.as_array())
            .and_then(|entries| {
                entries
                    .iter()
                    .find(|e| e.get("denom").and_then(|d| d.as_str()) == Some(denom))
            })
            .and_then(|e| e.get("amount"))
            .and_then(|a| a.as_str())
            .map(|a| a.parse::<u128>())
            .transpose()
            .map_err(|e| ChainError::malformed(&url, format!("bad amount: {}", e)))?
            .unwrap_or(0);

        debug!(address = %address, denom = %denom, amount, "Queried balance");
        Ok(amount)
    }

    /// Sign a transaction body over the given messages.
    fn sign_tx(
        &self,
        msgs: &[Any],
        fee: Fee,
        account: &AccountInfo,
    ) -> Result<Vec<u8>, ChainError> {
        let body = tx::Body::new(msgs.to_vec(), "", 0u32);

        let signer_info =
            SignerInfo::single_direct(Some(self.signer.public_key()), account.sequence);
        let auth_info = signer_info.auth_info(fee);

        let chain_id = self
            .config
            .chain_id
            .parse()
            .map_err(|_| ChainError::Rpc(format!("invalid chain ID {}", self.config.chain_id)))?;

        let sign_doc = SignDoc::new(&body, &auth_info, &chain_id, account.account_number)
            .map_err(|e| ChainError::Signing(format!("sign doc assembly failed: {}", e)))?;

        let tx_raw = self.signer.sign(sign_doc)?;

        tx_raw
            .to_bytes()
            .map_err(|e| ChainError::Encoding(format!("tx serialization failed: {}", e)))
    }

    fn fee_coin(&self, amount: u128) -> Result<Coin, ChainError> {
        Ok(Coin {
            denom: self
                .config
                .fee_denom
                .parse()
                .map_err(|e| ChainError::Encoding(format!("invalid fee denom: {:?}", e)))?,
            amount,
        })
    }

    /// Simulate the messages against the chain and return the gas estimate.
    ///
    /// Nothing is broadcast; a failure here is safe to retry.
    pub async fn simulate(&self, msgs: &[Any], account: &AccountInfo) -> Result<u64, ChainError> {
        let fee = Fee::from_amount_and_gas(self.fee_coin(0)?, SIMULATION_GAS_PLACEHOLDER);
        let tx_bytes = self.sign_tx(msgs, fee, account)?;

        let url = format!("{}/cosmos/tx/v1beta1/simulate", self.lcd_url());
        let request = serde_json::json!({
            "tx_bytes": base64::engine::general_purpose::STANDARD.encode(&tx_bytes),
        });

        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();
        let body: serde_json::Value = response.json().await.unwrap_or_default();

        if !status.is_success() {
            return Err(ChainError::Simulation(format!(
                "simulate returned {}: {}",
                status, body
            )));
        }

        let gas_used = body
            .get("gas_info")
            .and_then(|g| g.get("gas_used"))
            .and_then(|v| v.as_str())
            .and_then(|v| v.parse::<u64>().ok())
            .ok_or_else(|| ChainError::Simulation(format!("no gas estimate in response: {}", body)))?;

        debug!(gas_used, "Simulation succeeded");
        Ok(gas_used)
    }

    /// Simulate, size the fee, sign, and broadcast in one sequence.
    ///
    /// The fee is `simulated gas x multiplier` at the configured fixed gas
    /// price. The simulation and the final signature share one account
    /// snapshot, so the sequence cannot drift between the two phases.
    pub async fn sign_and_broadcast(&self, msgs: &[Any]) -> Result<BroadcastOutcome, ChainError> {
        let account = self.account_info().await?;

        let gas_used = self.simulate(msgs, &account).await?;
        let gas_limit = gas_used.saturating_mul(self.config.gas_multiplier);
        let fee_amount = ((gas_limit as f64) * self.config.gas_price).ceil() as u128;

        debug!(gas_used, gas_limit, fee_amount, "Fee computed from simulation");

        let fee = Fee::from_amount_and_gas(self.fee_coin(fee_amount)?, gas_limit);
        let tx_bytes = self.sign_tx(msgs, fee, &account)?;

        self.broadcast(&tx_bytes).await
    }

    /// Broadcast a signed transaction and wait for block inclusion.
    ///
    /// The returned outcome carries the code and raw log of the confirmed
    /// transaction, so an on-chain rejection is visible to the caller as a
    /// non-zero code rather than as a transport error.
    pub async fn broadcast(&self, tx_bytes: &[u8]) -> Result<BroadcastOutcome, ChainError> {
        let url = format!("{}/cosmos/tx/v1beta1/txs", self.lcd_url());
        let request = serde_json::json!({
            "tx_bytes": base64::engine::general_purpose::STANDARD.encode(tx_bytes),
            "mode": "BROADCAST_MODE_SYNC",
        });

        info!(url = %url, tx_bytes_len = tx_bytes.len(), "Broadcasting transaction");

        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();
        let body: serde_json::Value = response.json().await.unwrap_or_default();

        if !status.is_success() {
            return Err(ChainError::Rpc(format!(
                "broadcast failed: {} - {}",
                status, body
            )));
        }

        let tx_response = body
            .get("tx_response")
            .ok_or_else(|| ChainError::malformed(&url, "missing 'tx_response'"))?;

        let code = tx_response
            .get("code")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32;
        let tx_hash = tx_response
            .get("txhash")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        let raw_log = tx_response
            .get("raw_log")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        if code != 0 {
            // Rejected at CheckTx; never entered a block.
            return Ok(BroadcastOutcome {
                tx_hash,
                code,
                raw_log,
            });
        }

        info!(tx_hash = %tx_hash, "Broadcast accepted, waiting for confirmation");

        match self.wait_for_confirmation(&tx_hash).await {
            Ok(confirmed) => Ok(confirmed),
            Err(ChainError::ConfirmationTimeout(_)) => {
                warn!(tx_hash = %tx_hash, "Confirmation polling timed out, returning sync result");
                Ok(BroadcastOutcome {
                    tx_hash,
                    code,
                    raw_log,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Poll the tx endpoint until the transaction appears in a block.
    async fn wait_for_confirmation(&self, tx_hash: &str) -> Result<BroadcastOutcome, ChainError> {
        let timeout = Duration::from_secs(30);
        let max_delay = Duration::from_secs(3);

        let start = Instant::now();
        let mut delay = Duration::from_millis(500);

        let url = format!("{}/cosmos/tx/v1beta1/txs/{}", self.lcd_url(), tx_hash);

        while start.elapsed() < timeout {
            tokio::time::sleep(delay).await;

            match self.client.get(&url).send().await {
                Ok(response) => {
                    if response.status().is_success() {
                        let body: serde_json::Value = response.json().await.unwrap_or_default();

                        if let Some(tx_response) = body.get("tx_response") {
                            let code = tx_response
                                .get("code")
                                .and_then(|v| v.as_u64())
                                .unwrap_or(0) as u32;
                            let raw_log = tx_response
                                .get("raw_log")
                                .and_then(|v| v.as_str())
                                .unwrap_or("")
                                .to_string();
                            let height = tx_response
                                .get("height")
                                .and_then(|v| v.as_str())
                                .unwrap_or("unknown");

                            debug!(tx_hash = %tx_hash, height = %height, code, "Transaction confirmed");

                            return Ok(BroadcastOutcome {
                                tx_hash: tx_hash.to_string(),
                                code,
                                raw_log,
                            });
                        }
                    } else if response.status().as_u16() == 404 {
                        // Not yet indexed; keep polling.
                        debug!(
                            tx_hash = %tx_hash,
                            elapsed_ms = start.elapsed().as_millis(),
                            "Transaction not yet in block"
                        );
                    }
                }
                Err(e) => {
                    warn!(tx_hash = %tx_hash, error = %e, "Error querying transaction status");
                }
            }

            delay = std::cmp::min(delay * 2, max_delay);
        }

        Err(ChainError::ConfirmationTimeout(tx_hash.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noble::proto::MsgDepositForBurn;
    use crate::noble::signer::MnemonicSigner;
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_MNEMONIC: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn test_client(lcd_url: String) -> NobleClient {
        let signer = MnemonicSigner::new(TEST_MNEMONIC, "noble").unwrap();
        NobleClient::new(
            NobleClientConfig {
                lcd_url,
                ..NobleClientConfig::default()
            },
            Box::new(signer),
        )
        .unwrap()
    }

    fn burn_msg(client: &NobleClient) -> Any {
        MsgDepositForBurn {
            from: client.address(),
            amount: "1000000".to_string(),
            destination_domain: 0,
            mint_recipient: vec![0u8; 32],
            burn_token: "uusdc".to_string(),
        }
        .to_any()
    }

    fn mock_account_response() -> serde_json::Value {
        serde_json::json!({
            "account": {
                "@type": "/cosmos.auth.v1beta1.BaseAccount",
                "sequence": "7",
                "account_number": "42"
            }
        })
    }

    #[tokio::test]
    async fn test_balance_finds_denom() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/cosmos/bank/v1beta1/balances/.*$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "balances": [
                    {"denom": "ujolt", "amount": "12"},
                    {"denom": "uusdc", "amount": "123456"}
                ]
            })))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let balance = client.balance("noble1abc", "uusdc").await.unwrap();
        assert_eq!(balance, 123456);
    }

    #[tokio::test]
    async fn test_balance_absent_denom_is_zero() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/cosmos/bank/v1beta1/balances/.*$"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"balances": []})),
            )
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let balance = client.balance("noble1abc", "uusdc").await.unwrap();
        assert_eq!(balance, 0);
    }

    #[tokio::test]
    async fn test_account_info_parses_base_account() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/cosmos/auth/v1beta1/accounts/.*$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(mock_account_response()))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let info = client.account_info().await.unwrap();
        assert_eq!(info.sequence, 7);
        assert_eq!(info.account_number, 42);
    }

    #[tokio::test]
    async fn test_simulation_failure_aborts_before_broadcast() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/cosmos/auth/v1beta1/accounts/.*$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(mock_account_response()))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/cosmos/tx/v1beta1/simulate"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "code": 2, "message": "simulation failed"
            })))
            .mount(&server)
            .await;

        // The broadcast endpoint must never be touched.
        Mock::given(method("POST"))
            .and(path("/cosmos/tx/v1beta1/txs"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let msg = burn_msg(&client);
        let result = client.sign_and_broadcast(&[msg]).await;

        assert!(matches!(result, Err(ChainError::Simulation(_))));
    }

    #[tokio::test]
    async fn test_broadcast_surfaces_checktx_rejection() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/cosmos/auth/v1beta1/accounts/.*$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(mock_account_response()))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/cosmos/tx/v1beta1/simulate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "gas_info": {"gas_wanted": "200000", "gas_used": "95000"}
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/cosmos/tx/v1beta1/txs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tx_response": {
                    "txhash": "ABC123",
                    "code": 32,
                    "raw_log": "account sequence mismatch"
                }
            })))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let msg = burn_msg(&client);
        let outcome = client.sign_and_broadcast(&[msg]).await.unwrap();

        assert_eq!(outcome.code, 32);
        assert!(!outcome.is_success());
        assert_eq!(outcome.tx_hash, "ABC123");
    }
}
