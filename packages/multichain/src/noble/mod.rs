//! Noble hub chain access.
//!
//! The hub speaks native Cosmos SDK modules (Circle CCTP, bank, IBC
//! transfer). Transactions are signed with cosmrs and submitted over the
//! LCD REST API: account queries, gas simulation, broadcast, confirmation
//! polling, and bank balance reads all go through [`client::NobleClient`].

pub mod client;
pub mod proto;
pub mod signer;

pub use client::{AccountInfo, NobleClient, NobleClientConfig};
pub use signer::{CosmosSigner, MnemonicSigner};
