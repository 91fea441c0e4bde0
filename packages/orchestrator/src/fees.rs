//! Per-destination fee and expected-time lookup.
//!
//! The route table is fetched once per session from the backend (see
//! [`crate::backend::BackendClient::fetch_route_table`]) and consulted
//! synchronously afterwards. A missing entry degrades to a zero fee and a
//! generic ETA rather than failing the transfer: a stale table must never
//! block a send.

use serde::Deserialize;
use tracing::warn;
use transit_multichain::Domain;

/// One destination entry of the route table.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteEntry {
    #[serde(rename = "chainName")]
    pub chain_name: String,
    /// Fee in hub base units, as a decimal string.
    pub fee: String,
    /// Human-readable expected arrival time.
    pub time: String,
    /// Circle domain ID of the destination.
    pub domain: u32,
}

/// Route table as served by the backend.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteTable {
    /// Fee collector address on the hub chain.
    pub minter: Option<String>,
    #[serde(rename = "targetChains", default)]
    pub target_chains: Vec<RouteEntry>,
}

/// Fee and ETA for one destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteFee {
    /// Fee in hub base units; zero when the table has no entry.
    pub fee: u128,
    pub eta: String,
}

impl RouteTable {
    /// Look up the fee and ETA for a destination.
    ///
    /// Unknown destinations (or unparseable fee strings) yield a zero fee
    /// and the generic ETA; the degradation is logged, not raised.
    pub fn fee_and_eta(&self, target: Domain) -> RouteFee {
        let entry = self
            .target_chains
            .iter()
            .find(|e| e.chain_name == target.chain_name());

        match entry {
            Some(entry) => {
                let fee = entry.fee.parse().unwrap_or_else(|_| {
                    warn!(target = %target, fee = %entry.fee, "Unparseable fee in route table");
                    0
                });
                RouteFee {
                    fee,
                    eta: entry.time.clone(),
                }
            }
            None => {
                warn!(target = %target, "No route table entry, proceeding with zero fee");
                RouteFee {
                    fee: 0,
                    eta: "minutes".to_string(),
                }
            }
        }
    }

    /// Fee collector address, if the table carries one.
    pub fn minter(&self) -> Option<&str> {
        self.minter.as_deref()
    }
}
