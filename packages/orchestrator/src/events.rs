//! Transfer progress events.
//!
//! The orchestrator emits explicit state-change events on a channel so a
//! presentation layer can render progress without the core depending on any
//! UI. Every event is also mirrored to tracing.

use crate::transfer::{BurnReceipt, RelayResult, TransferPhase};

#[derive(Debug, Clone)]
pub enum TransferEvent {
    PhaseChanged {
        from: TransferPhase,
        to: TransferPhase,
    },
    /// The burn landed; the receipt is the durable recovery handle.
    BurnSubmitted { receipt: BurnReceipt },
    AttestationComplete,
    MintRelayed { result: RelayResult },
    /// The relayed mint was observed as an actual credit on the hub.
    HubCredited { balance: u128 },
    Forwarded { result: RelayResult },
    Completed,
    Failed {
        reason: String,
        /// True when a burn already succeeded: funds are safely burned and
        /// the credit is still pending, as opposed to nothing happened.
        funds_safe_pending: bool,
    },
}
