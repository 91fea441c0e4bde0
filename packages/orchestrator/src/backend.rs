//! Backend integration: route table fetch and the manual mint-on-EVM call.

use std::time::Duration;

use serde::Deserialize;
use tracing::info;
use transit_multichain::ChainError;

use crate::fees::RouteTable;

/// Client for the transfer backend.
pub struct BackendClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct MintOnEvmResponse {
    status: i64,
    error: Option<String>,
    message: Option<String>,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Result<Self, ChainError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Fetch the per-destination fee and ETA table. Called once per session.
    pub async fn fetch_route_table(&self) -> Result<RouteTable, ChainError> {
        let url = format!("{}/api/cctp-params", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(ChainError::Rpc(format!(
                "route table fetch failed: {}",
                response.status()
            )));
        }

        let table: RouteTable = response.json().await?;
        info!(destinations = table.target_chains.len(), "Route table loaded");
        Ok(table)
    }

    /// Ask the backend to complete a hub-origin mint on the EVM destination.
    ///
    /// This is a manual recovery path: the orchestrator's state machine does
    /// not drive it, since the bridge's own off-chain relayer normally
    /// completes hub-origin transfers.
    pub async fn mint_on_evm(
        &self,
        messages: &serde_json::Value,
        transaction_hash: &str,
    ) -> Result<(), ChainError> {
        let url = format!("{}/api/mint-on-evm", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "messages": messages,
                "transactionHash": transaction_hash,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ChainError::Rpc(format!(
                "mint-on-evm failed: {}",
                response.status()
            )));
        }

        let body: MintOnEvmResponse = response.json().await?;

        if body.status != 1 {
            return Err(ChainError::Rpc(format!(
                "mint-on-evm rejected: {}",
                body.error.or(body.message).unwrap_or_default()
            )));
        }

        info!(tx_hash = %transaction_hash, "Backend accepted mint-on-evm request");
        Ok(())
    }
}
