//! Orchestrator configuration, loaded from environment variables.

use std::fmt;
use std::time::Duration;

use eyre::{eyre, Result};
use std::env;
use transit_multichain::Domain;

/// Full orchestrator configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub evm: EvmConfig,
    pub noble: NobleConfig,
    pub forward: ForwardSettings,
    pub attestation: AttestationSettings,
    pub watcher: WatcherSettings,
    /// Transfer backend base URL; without it the route table stays empty
    /// (zero-fee degradation) and mint-on-evm recovery is unavailable.
    pub backend_url: Option<String>,
}

/// Active EVM source chain.
#[derive(Clone)]
pub struct EvmConfig {
    /// Which bridge domain this connection serves.
    pub domain: Domain,
    pub rpc_url: String,
    pub chain_id: u64,
    pub usdc_address: String,
    pub token_messenger_address: String,
    pub private_key: String,
}

/// Custom Debug that redacts private_key to prevent accidental log leakage.
impl fmt::Debug for EvmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvmConfig")
            .field("domain", &self.domain)
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.chain_id)
            .field("usdc_address", &self.usdc_address)
            .field("token_messenger_address", &self.token_messenger_address)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Hub chain connection.
#[derive(Clone)]
pub struct NobleConfig {
    pub lcd_url: String,
    pub chain_id: String,
    pub mnemonic: String,
    /// Fixed gas price in uusdc per gas unit.
    pub gas_price: f64,
}

/// Custom Debug that redacts the mnemonic.
impl fmt::Debug for NobleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NobleConfig")
            .field("lcd_url", &self.lcd_url)
            .field("chain_id", &self.chain_id)
            .field("mnemonic", &"<redacted>")
            .field("gas_price", &self.gas_price)
            .finish()
    }
}

/// IBC hop settings.
#[derive(Debug, Clone)]
pub struct ForwardSettings {
    pub channel: String,
    pub reserve: u128,
    pub timeout: Duration,
}

/// Attestation poller settings.
#[derive(Debug, Clone)]
pub struct AttestationSettings {
    pub base_url: String,
    pub interval: Duration,
    pub max_attempts: u32,
}

/// Balance watcher settings.
#[derive(Debug, Clone)]
pub struct WatcherSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from the environment (and a `.env` file if one is
    /// present).
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded .env from {:?}", path);
        }

        let evm = EvmConfig {
            domain: env::var("EVM_DOMAIN")
                .unwrap_or_else(|_| "ETH".to_string())
                .parse()
                .map_err(|e| eyre!("Invalid EVM_DOMAIN: {}", e))?,
            rpc_url: env::var("EVM_RPC_URL").map_err(|_| eyre!("EVM_RPC_URL required"))?,
            chain_id: env::var("EVM_CHAIN_ID")
                .map_err(|_| eyre!("EVM_CHAIN_ID required"))?
                .parse()
                .map_err(|_| eyre!("Invalid EVM_CHAIN_ID"))?,
            usdc_address: env::var("EVM_USDC_ADDRESS")
                .map_err(|_| eyre!("EVM_USDC_ADDRESS required"))?,
            token_messenger_address: env::var("EVM_TOKEN_MESSENGER_ADDRESS")
                .map_err(|_| eyre!("EVM_TOKEN_MESSENGER_ADDRESS required"))?,
            private_key: env::var("EVM_PRIVATE_KEY")
                .map_err(|_| eyre!("EVM_PRIVATE_KEY required"))?,
        };

        let noble = NobleConfig {
            lcd_url: env::var("NOBLE_LCD_URL")
                .unwrap_or_else(|_| "https://lcd-noble.keplr.app".to_string()),
            chain_id: env::var("NOBLE_CHAIN_ID").unwrap_or_else(|_| "noble-1".to_string()),
            mnemonic: env::var("NOBLE_MNEMONIC").map_err(|_| eyre!("NOBLE_MNEMONIC required"))?,
            gas_price: env_or("NOBLE_GAS_PRICE", 0.1),
        };

        Ok(Self {
            evm,
            noble,
            forward: ForwardSettings {
                channel: env::var("IBC_CHANNEL").unwrap_or_else(|_| "channel-81".to_string()),
                reserve: env_or("IBC_RESERVE", 50_000),
                timeout: Duration::from_secs(env_or("IBC_TIMEOUT_SECS", 600)),
            },
            attestation: AttestationSettings {
                base_url: env::var("ATTESTATION_BASE_URL")
                    .unwrap_or_else(|_| "https://iris-api.circle.com".to_string()),
                interval: Duration::from_secs(env_or("ATTESTATION_INTERVAL_SECS", 20)),
                max_attempts: env_or("ATTESTATION_MAX_ATTEMPTS", 20),
            },
            watcher: WatcherSettings {
                interval: Duration::from_secs(env_or("WATCH_INTERVAL_SECS", 6)),
                timeout: Duration::from_secs(env_or("WATCH_TIMEOUT_SECS", 300)),
            },
            backend_url: env::var("BACKEND_URL").ok(),
        })
    }
}
