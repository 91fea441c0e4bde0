//! EVM chain access: provider/signer wiring, CCTP contract bindings, and the
//! allowance/burn call surface used by the transfer orchestrator.

pub mod client;
pub mod contracts;
pub mod messenger;

pub use client::{EvmConnection, EvmConnectionConfig};
pub use messenger::TokenMessengerClient;
