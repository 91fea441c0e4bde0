//! Transit multichain: shared cross-chain library for the Transit USDC bridge.
//!
//! This crate provides the chain-access layer shared by the transfer
//! orchestrator and any tooling built around it:
//!
//! - **Types** - Bridge domains, Circle domain IDs, chain parameters
//! - **Address Codec** - 32-byte mint-recipient encoding for EVM and bech32
//!   addresses, bech32 prefix conversion
//! - **EVM Module** - Provider/signer wiring, CCTP TokenMessenger and ERC-20
//!   bindings, allowance and burn calls
//! - **Noble Module** - LCD client for the hub chain: account queries, tx
//!   signing, simulate/broadcast, bank balances, and the protobuf messages
//!   for the Circle CCTP module and IBC transfers

pub mod address_codec;
pub mod error;
pub mod evm;
pub mod noble;
pub mod types;

pub use address_codec::{
    convert_bech32_prefix, decode_bech32_payload, encode_mint_recipient, parse_evm_address,
};
pub use error::ChainError;
pub use types::{BroadcastOutcome, ChainKind, Domain, DomainId, HUB_DOMAIN_ID, USDC_DECIMALS, UUSDC};
