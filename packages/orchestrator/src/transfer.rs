//! The cross-domain transfer state machine.
//!
//! One orchestrator instance drives one transfer at a time from submission
//! to completion. State only advances forward or into `Failed`; at most one
//! leg operation is in flight for a given request, and every leg starts only
//! after the previous leg's externally observed effect (receipt, confirmed
//! transaction, balance credit) where one exists.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{error, info};
use transit_multichain::{
    decode_bech32_payload, encode_mint_recipient, parse_evm_address, ChainKind, Domain,
    HUB_DOMAIN_ID,
};

use crate::error::{PollTarget, TransferError};
use crate::events::TransferEvent;
use crate::legs::{
    AllowanceLeg, AttestationLeg, BalanceWatchLeg, BurnLeg, ForwardLeg, ForwardOutcome, RelayLeg,
};
use crate::poll::{CancelToken, PollOutcome};
use crate::watcher::Direction;

/// Immutable input describing one transfer. Created when the caller confirms
/// the transfer; never mutated.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub source: Domain,
    pub target: Domain,
    /// Destination address in the target domain's native encoding.
    pub recipient: String,
    /// Amount in base units (6 decimals).
    pub amount: u128,
}

/// Durable handle to a completed burn. Retained across failures so the
/// mint/relay leg can be retried without burning again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurnReceipt {
    pub source: Domain,
    pub tx_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Result of a hub broadcast (mint relay or IBC forward).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayResult {
    pub tx_hash: String,
    /// 0 is success; non-zero means included but rejected.
    pub code: u32,
    pub raw_log: String,
}

/// Phases of a transfer, in the only order they may be visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TransferPhase {
    Idle,
    CheckingAllowance,
    Approving,
    Depositing,
    AwaitingAttestation,
    RelayingMint,
    AwaitingIntermediateCredit,
    ForwardingIbc,
    Completed,
    Failed,
}

/// A transfer that reached `Completed`.
#[derive(Debug)]
pub struct CompletedTransfer {
    pub request: TransferRequest,
    pub receipt: Option<BurnReceipt>,
    pub relay: Option<RelayResult>,
    pub forward: Option<RelayResult>,
}

/// A transfer that reached `Failed`.
///
/// `receipt` distinguishes the two terminal stories: `Some` means the funds
/// are safely burned and the credit is still pending (retry with
/// [`Orchestrator::resume`]); `None` means nothing happened on chain and
/// resubmitting is safe.
#[derive(Debug)]
pub struct TransferFailure {
    pub error: TransferError,
    pub receipt: Option<BurnReceipt>,
    /// Phase the machine was in when the failure occurred.
    pub failed_from: TransferPhase,
}

impl TransferFailure {
    pub fn funds_safe_pending(&self) -> bool {
        self.receipt.is_some()
    }
}

impl std::fmt::Display for TransferFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(receipt) = &self.receipt {
            write!(
                f,
                "{} (funds burned in {}, credit pending; keep this reference)",
                self.error, receipt.tx_hash
            )
        } else {
            write!(f, "{} (nothing happened on chain, safe to retry)", self.error)
        }
    }
}

impl std::error::Error for TransferFailure {}

/// The component legs the orchestrator sequences.
pub struct Legs {
    pub allowance: Box<dyn AllowanceLeg>,
    pub burn: Box<dyn BurnLeg>,
    pub attestation: Box<dyn AttestationLeg>,
    pub relay: Box<dyn RelayLeg>,
    pub watch: Box<dyn BalanceWatchLeg>,
    pub forward: Box<dyn ForwardLeg>,
}

/// The transfer orchestrator.
pub struct Orchestrator {
    legs: Legs,
    /// The signer-controlled account on the hub, used as the intermediate
    /// credit account for forwarded transfers.
    hub_address: String,
    hub_denom: String,
    events: Option<mpsc::UnboundedSender<TransferEvent>>,
}

/// Forward-only phase tracking with event emission.
struct Progress<'a> {
    phase: TransferPhase,
    events: Option<&'a mpsc::UnboundedSender<TransferEvent>>,
}

impl Progress<'_> {
    fn advance(&mut self, to: TransferPhase) {
        debug_assert!(to > self.phase, "transfer state only advances forward");
        let from = std::mem::replace(&mut self.phase, to);
        info!(from = ?from, to = ?to, "Transfer phase");
        self.emit(TransferEvent::PhaseChanged { from, to });
    }

    fn emit(&self, event: TransferEvent) {
        if let Some(tx) = self.events {
            let _ = tx.send(event);
        }
    }

    fn fail(&mut self, error: TransferError, receipt: Option<BurnReceipt>) -> TransferFailure {
        let failed_from = std::mem::replace(&mut self.phase, TransferPhase::Failed);
        error!(phase = ?failed_from, error = %error, "Transfer failed");
        self.emit(TransferEvent::PhaseChanged {
            from: failed_from,
            to: TransferPhase::Failed,
        });
        self.emit(TransferEvent::Failed {
            reason: error.to_string(),
            funds_safe_pending: receipt.is_some(),
        });
        TransferFailure {
            error,
            receipt,
            failed_from,
        }
    }
}

impl Orchestrator {
    pub fn new(legs: Legs, hub_address: String, hub_denom: String) -> Self {
        Self {
            legs,
            hub_address,
            hub_denom,
            events: None,
        }
    }

    /// Subscribe to state-change events. Call before `execute`.
    pub fn event_stream(&mut self) -> mpsc::UnboundedReceiver<TransferEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    /// Drive one transfer to a terminal state.
    pub async fn execute(
        &self,
        request: TransferRequest,
        cancel: &CancelToken,
    ) -> Result<CompletedTransfer, TransferFailure> {
        let mut progress = Progress {
            phase: TransferPhase::Idle,
            events: self.events.as_ref(),
        };

        if let Err(e) = validate_request(&request) {
            return Err(progress.fail(e, None));
        }

        info!(
            source = %request.source,
            target = %request.target,
            amount = request.amount,
            "Starting transfer"
        );

        match request.source.kind() {
            ChainKind::Evm => self.run_evm_origin(request, cancel, &mut progress).await,
            ChainKind::Cosmos => self.run_cosmos_origin(request, &mut progress).await,
        }
    }

    /// Re-enter a partially completed EVM-origin transfer from its burn
    /// receipt, retrying the attestation/relay legs (and the IBC hop when
    /// the target needs one) without burning again.
    pub async fn resume(
        &self,
        request: TransferRequest,
        receipt: BurnReceipt,
        cancel: &CancelToken,
    ) -> Result<CompletedTransfer, TransferFailure> {
        let mut progress = Progress {
            phase: TransferPhase::Depositing,
            events: self.events.as_ref(),
        };

        if let Err(e) = validate_request(&request) {
            return Err(progress.fail(e, Some(receipt)));
        }

        if request.source.kind() != ChainKind::Evm {
            return Err(progress.fail(
                TransferError::Validation(
                    "only EVM-origin transfers resume from a burn receipt".to_string(),
                ),
                Some(receipt),
            ));
        }

        info!(tx_hash = %receipt.tx_hash, "Resuming transfer from burn receipt");

        self.finish_from_attestation(request, receipt, cancel, &mut progress)
            .await
    }

    async fn run_evm_origin(
        &self,
        request: TransferRequest,
        cancel: &CancelToken,
        progress: &mut Progress<'_>,
    ) -> Result<CompletedTransfer, TransferFailure> {
        progress.advance(TransferPhase::CheckingAllowance);

        let current = match self.legs.allowance.current_allowance().await {
            Ok(current) => current,
            Err(e) => return Err(progress.fail(e, None)),
        };

        if current < request.amount {
            progress.advance(TransferPhase::Approving);
            if let Err(e) = self.legs.allowance.approve(request.amount).await {
                return Err(progress.fail(e, None));
            }
        }

        progress.advance(TransferPhase::Depositing);

        // A forwarded transfer mints to the hub signer first; the recipient
        // only receives on the final IBC leg.
        let mint_target = if request.target.requires_ibc_hop() {
            self.hub_address.as_str()
        } else {
            request.recipient.as_str()
        };
        let mint_recipient = match encode_mint_recipient(mint_target) {
            Ok(encoded) => encoded,
            Err(e) => {
                return Err(progress.fail(TransferError::Validation(e.to_string()), None));
            }
        };

        let receipt = match self
            .legs
            .burn
            .submit_burn(&request, HUB_DOMAIN_ID, mint_recipient)
            .await
        {
            Ok(receipt) => receipt,
            Err(e) => return Err(progress.fail(e, None)),
        };

        progress.emit(TransferEvent::BurnSubmitted {
            receipt: receipt.clone(),
        });

        self.finish_from_attestation(request, receipt, cancel, progress)
            .await
    }

    async fn run_cosmos_origin(
        &self,
        request: TransferRequest,
        progress: &mut Progress<'_>,
    ) -> Result<CompletedTransfer, TransferFailure> {
        progress.advance(TransferPhase::Depositing);

        let destination = match request.target.domain_id() {
            Some(id) => id,
            None => {
                return Err(progress.fail(
                    TransferError::Validation(format!(
                        "{} is not a bridge destination",
                        request.target
                    )),
                    None,
                ));
            }
        };

        let mint_recipient = match encode_mint_recipient(&request.recipient) {
            Ok(encoded) => encoded,
            Err(e) => {
                return Err(progress.fail(TransferError::Validation(e.to_string()), None));
            }
        };

        let receipt = match self
            .legs
            .burn
            .submit_burn(&request, destination, mint_recipient)
            .await
        {
            Ok(receipt) => receipt,
            Err(e) => return Err(progress.fail(e, None)),
        };

        progress.emit(TransferEvent::BurnSubmitted {
            receipt: receipt.clone(),
        });

        // The mint on the EVM destination is completed by the bridge's own
        // off-chain relayer; this orchestrator does not poll for it.
        progress.advance(TransferPhase::Completed);
        progress.emit(TransferEvent::Completed);

        Ok(CompletedTransfer {
            request,
            receipt: Some(receipt),
            relay: None,
            forward: None,
        })
    }

    /// Attestation → relay → (balance watch → IBC forward) → completed.
    /// Every failure past this point retains the burn receipt.
    async fn finish_from_attestation(
        &self,
        request: TransferRequest,
        receipt: BurnReceipt,
        cancel: &CancelToken,
        progress: &mut Progress<'_>,
    ) -> Result<CompletedTransfer, TransferFailure> {
        progress.advance(TransferPhase::AwaitingAttestation);

        let source_domain = match request.source.domain_id() {
            Some(id) => id,
            None => {
                return Err(progress.fail(
                    TransferError::Validation(format!(
                        "{} is not a bridge domain",
                        request.source
                    )),
                    Some(receipt),
                ));
            }
        };

        let record = match self
            .legs
            .attestation
            .await_attestation(source_domain, &receipt.tx_hash, cancel)
            .await
        {
            Ok(PollOutcome::Ready(record)) => {
                progress.emit(TransferEvent::AttestationComplete);
                record
            }
            Ok(PollOutcome::TimedOut { waited }) => {
                return Err(progress.fail(
                    TransferError::PollTimeout {
                        target: PollTarget::Attestation,
                        waited,
                    },
                    Some(receipt),
                ));
            }
            Ok(PollOutcome::Cancelled) => {
                return Err(progress.fail(TransferError::Cancelled, Some(receipt)));
            }
            Err(e) => return Err(progress.fail(e, Some(receipt))),
        };

        progress.advance(TransferPhase::RelayingMint);

        let relay = match self.legs.relay.relay(&record).await {
            Ok(result) => result,
            Err(e) => return Err(progress.fail(e, Some(receipt))),
        };

        progress.emit(TransferEvent::MintRelayed {
            result: relay.clone(),
        });

        let forward = if request.target.requires_ibc_hop() {
            progress.advance(TransferPhase::AwaitingIntermediateCredit);

            let balance = match self
                .legs
                .watch
                .await_change(
                    &self.hub_address,
                    &self.hub_denom,
                    Direction::Increase,
                    cancel,
                )
                .await
            {
                Ok(PollOutcome::Ready(balance)) => {
                    progress.emit(TransferEvent::HubCredited { balance });
                    balance
                }
                Ok(PollOutcome::TimedOut { waited }) => {
                    return Err(progress.fail(
                        TransferError::PollTimeout {
                            target: PollTarget::BalanceChange,
                            waited,
                        },
                        Some(receipt),
                    ));
                }
                Ok(PollOutcome::Cancelled) => {
                    return Err(progress.fail(TransferError::Cancelled, Some(receipt)));
                }
                Err(e) => return Err(progress.fail(e, Some(receipt))),
            };

            progress.advance(TransferPhase::ForwardingIbc);

            match self.legs.forward.forward(&request, balance).await {
                Ok(ForwardOutcome::Sent(result)) => {
                    progress.emit(TransferEvent::Forwarded {
                        result: result.clone(),
                    });
                    Some(result)
                }
                Ok(ForwardOutcome::InsufficientBalance { available, reserve }) => {
                    return Err(progress.fail(
                        TransferError::InsufficientBalance { available, reserve },
                        Some(receipt),
                    ));
                }
                Err(e) => return Err(progress.fail(e, Some(receipt))),
            }
        } else {
            None
        };

        progress.advance(TransferPhase::Completed);
        progress.emit(TransferEvent::Completed);

        Ok(CompletedTransfer {
            request,
            receipt: Some(receipt),
            relay: Some(relay),
            forward,
        })
    }
}

/// Reject bad input before any leg runs.
fn validate_request(request: &TransferRequest) -> Result<(), TransferError> {
    if request.amount == 0 {
        return Err(TransferError::Validation("amount must be positive".into()));
    }

    if request.source.domain_id().is_none() {
        return Err(TransferError::Validation(format!(
            "{} is not a bridge domain and cannot originate a transfer",
            request.source
        )));
    }

    let route_supported = match (request.source.kind(), request.target) {
        (ChainKind::Evm, Domain::Noble | Domain::Joltify) => true,
        (ChainKind::Cosmos, target) => request.source == Domain::Noble && target.kind() == ChainKind::Evm,
        _ => false,
    };
    if !route_supported {
        return Err(TransferError::Validation(format!(
            "unsupported route {} -> {}",
            request.source, request.target
        )));
    }

    match request.target.bech32_prefix() {
        Some(expected_hrp) => {
            let (_, hrp) = decode_bech32_payload(&request.recipient)
                .map_err(|e| TransferError::Validation(e.to_string()))?;
            if hrp != expected_hrp {
                return Err(TransferError::Validation(format!(
                    "recipient prefix {} does not match {} ({})",
                    hrp, request.target, expected_hrp
                )));
            }
        }
        None => {
            parse_evm_address(&request.recipient)
                .map_err(|e| TransferError::Validation(e.to_string()))?;
        }
    }

    Ok(())
}
