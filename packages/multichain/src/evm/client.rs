//! EVM connection wiring.
//!
//! Wraps alloy's `PrivateKeySigner` and `EthereumWallet` and hands out a
//! fresh wallet-backed provider per contract interaction. The signer
//! capability is injected by the caller through the configuration; nothing
//! is read from ambient state.

use alloy::{
    network::EthereumWallet,
    primitives::Address,
    providers::{Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    transports::http::{Client, Http},
};
use tracing::info;

use crate::error::ChainError;

/// Configuration for one EVM source chain.
#[derive(Clone)]
pub struct EvmConnectionConfig {
    /// RPC URL (e.g. "https://eth.llamarpc.com")
    pub rpc_url: String,
    /// Native chain ID
    pub chain_id: u64,
    /// USDC token contract address
    pub usdc_address: Address,
    /// CCTP TokenMessenger contract address
    pub token_messenger_address: Address,
    /// Private key (hex string, with or without 0x prefix)
    pub private_key: String,
}

impl std::fmt::Debug for EvmConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmConnectionConfig")
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.chain_id)
            .field("usdc_address", &self.usdc_address)
            .field("token_messenger_address", &self.token_messenger_address)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// An EVM chain connection with signing capability.
pub struct EvmConnection {
    wallet: EthereumWallet,
    rpc_url: reqwest::Url,
    chain_id: u64,
    address: Address,
    usdc_address: Address,
    token_messenger_address: Address,
}

impl EvmConnection {
    pub fn new(config: EvmConnectionConfig) -> Result<Self, ChainError> {
        let signer: PrivateKeySigner = config
            .private_key
            .parse()
            .map_err(|e| ChainError::Signing(format!("invalid private key: {}", e)))?;

        let address = signer.address();
        let wallet = EthereumWallet::from(signer);

        let rpc_url = config
            .rpc_url
            .parse()
            .map_err(|e| ChainError::Rpc(format!("invalid RPC URL: {}", e)))?;

        info!(
            rpc_url = %config.rpc_url,
            chain_id = config.chain_id,
            address = %address,
            "EVM connection initialized"
        );

        Ok(Self {
            wallet,
            rpc_url,
            chain_id: config.chain_id,
            address,
            usdc_address: config.usdc_address,
            token_messenger_address: config.token_messenger_address,
        })
    }

    /// Signer's address on this chain.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn usdc_address(&self) -> Address {
        self.usdc_address
    }

    pub fn token_messenger_address(&self) -> Address {
        self.token_messenger_address
    }

    /// A wallet-backed provider for one interaction.
    pub(crate) fn provider(&self) -> impl Provider<Http<Client>> {
        ProviderBuilder::new()
            .wallet(self.wallet.clone())
            .on_http(self.rpc_url.clone())
    }
}
