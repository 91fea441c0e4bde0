//! Shared types for the Transit bridge domains.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ChainError;

/// Base-unit denom of the bridged asset on the hub chain.
pub const UUSDC: &str = "uusdc";

/// USDC precision on every supported domain.
pub const USDC_DECIMALS: u32 = 6;

/// Circle domain ID of the hub chain.
pub const HUB_DOMAIN_ID: DomainId = DomainId(4);

/// Circle-assigned numeric domain identifier.
///
/// See <https://developers.circle.com/stablecoins/docs/supported-domains>.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DomainId(pub u32);

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Execution model of a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainKind {
    Evm,
    Cosmos,
}

/// One blockchain network recognized by the bridge.
///
/// Joltify is not a bridge domain itself: it has no Circle domain ID and is
/// reached from Noble over IBC only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Domain {
    Ethereum,
    Avalanche,
    Arbitrum,
    Noble,
    Joltify,
}

impl Domain {
    pub fn kind(&self) -> ChainKind {
        match self {
            Domain::Ethereum | Domain::Avalanche | Domain::Arbitrum => ChainKind::Evm,
            Domain::Noble | Domain::Joltify => ChainKind::Cosmos,
        }
    }

    /// Circle domain ID, if this domain is directly attached to the bridge.
    pub fn domain_id(&self) -> Option<DomainId> {
        match self {
            Domain::Ethereum => Some(DomainId(0)),
            Domain::Avalanche => Some(DomainId(1)),
            Domain::Arbitrum => Some(DomainId(3)),
            Domain::Noble => Some(DomainId(4)),
            Domain::Joltify => None,
        }
    }

    /// Human-readable chain name, as the route table keys it.
    pub fn chain_name(&self) -> &'static str {
        match self {
            Domain::Ethereum => "Ethereum",
            Domain::Avalanche => "Avalanche",
            Domain::Arbitrum => "Arbitrum",
            Domain::Noble => "Noble",
            Domain::Joltify => "Joltify",
        }
    }

    /// bech32 human-readable prefix for Cosmos domains.
    pub fn bech32_prefix(&self) -> Option<&'static str> {
        match self {
            Domain::Noble => Some("noble"),
            Domain::Joltify => Some("jolt"),
            _ => None,
        }
    }

    /// True when reaching this domain requires the IBC hop off the hub.
    pub fn requires_ibc_hop(&self) -> bool {
        matches!(self, Domain::Joltify)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.chain_name())
    }
}

impl FromStr for Domain {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ETH" | "ETHEREUM" => Ok(Domain::Ethereum),
            "AVAX" | "AVALANCHE" => Ok(Domain::Avalanche),
            "ARB" | "ARBITRUM" => Ok(Domain::Arbitrum),
            "NOBLE" => Ok(Domain::Noble),
            "JOLT" | "JOLTIFY" => Ok(Domain::Joltify),
            other => Err(ChainError::UnknownDomain(other.to_string())),
        }
    }
}

/// Result of a broadcast on a Cosmos chain.
///
/// `code == 0` means the transaction executed successfully; any other code
/// means it was included but rejected by the chain's state machine.
#[derive(Debug, Clone)]
pub struct BroadcastOutcome {
    pub tx_hash: String,
    pub code: u32,
    pub raw_log: String,
}

impl BroadcastOutcome {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}
