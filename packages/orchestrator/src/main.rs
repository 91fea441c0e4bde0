//! Transit transfer CLI.
//!
//! Drives a single cross-domain USDC transfer end to end:
//!
//! ```text
//! transit-orchestrator <SOURCE> <TARGET> <AMOUNT_UUSDC> <RECIPIENT> [--resume <BURN_TX_HASH>]
//! ```
//!
//! Connection parameters come from the environment (see `config.rs`).
//! `--resume` re-enters a partially completed EVM-origin transfer from its
//! burn receipt instead of burning again.

use std::sync::Arc;

use chrono::Utc;
use eyre::{bail, eyre, WrapErr};
use tracing::{info, warn};

use transit_multichain::evm::{EvmConnection, EvmConnectionConfig};
use transit_multichain::noble::{MnemonicSigner, NobleClient, NobleClientConfig};
use transit_multichain::{ChainKind, Domain, UUSDC};

use transit_orchestrator::attestation::AttestationPoller;
use transit_orchestrator::backend::BackendClient;
use transit_orchestrator::config::Config;
use transit_orchestrator::fees::RouteTable;
use transit_orchestrator::legs::forward::ForwardConfig;
use transit_orchestrator::legs::{
    BurnLeg, EvmAllowanceLeg, EvmBurnLeg, NobleBurnLeg, NobleForwardLeg, NobleRelayLeg,
};
use transit_orchestrator::transfer::{BurnReceipt, Legs, Orchestrator, TransferRequest};
use transit_orchestrator::watcher::BalanceWatcher;
use transit_orchestrator::{cancel_pair, TransferEvent};

struct CliArgs {
    request: TransferRequest,
    resume_tx_hash: Option<String>,
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> eyre::Result<()> {
    init_logging();

    let args = parse_args()?;
    let config = Config::load()?;

    if args.request.source.kind() == ChainKind::Evm && args.request.source != config.evm.domain {
        bail!(
            "configured EVM connection serves {}, not {}",
            config.evm.domain,
            args.request.source
        );
    }

    info!(
        source = %args.request.source,
        target = %args.request.target,
        amount = args.request.amount,
        "Transit transfer starting"
    );

    // Hub chain client; every route touches the hub.
    let signer = MnemonicSigner::new(&config.noble.mnemonic, "noble")?;
    let noble = Arc::new(NobleClient::new(
        NobleClientConfig {
            lcd_url: config.noble.lcd_url.clone(),
            chain_id: config.noble.chain_id.clone(),
            fee_denom: UUSDC.to_string(),
            gas_price: config.noble.gas_price,
            gas_multiplier: 2,
        },
        Box::new(signer),
    )?);
    let hub_address = noble.address();

    // Route table: fetched once per session, degradable.
    let routes = match &config.backend_url {
        Some(url) => {
            let backend = BackendClient::new(url)?;
            match backend.fetch_route_table().await {
                Ok(table) => table,
                Err(e) => {
                    warn!(error = %e, "Route table unavailable, fees degrade to zero");
                    RouteTable::default()
                }
            }
        }
        None => {
            warn!("No BACKEND_URL set, fees degrade to zero");
            RouteTable::default()
        }
    };

    let route = routes.fee_and_eta(args.request.target);
    info!(fee = route.fee, eta = %route.eta, "Route fee estimate");

    let evm = Arc::new(EvmConnection::new(EvmConnectionConfig {
        rpc_url: config.evm.rpc_url.clone(),
        chain_id: config.evm.chain_id,
        usdc_address: config
            .evm
            .usdc_address
            .parse()
            .wrap_err("Invalid EVM_USDC_ADDRESS")?,
        token_messenger_address: config
            .evm
            .token_messenger_address
            .parse()
            .wrap_err("Invalid EVM_TOKEN_MESSENGER_ADDRESS")?,
        private_key: config.evm.private_key.clone(),
    })?);

    let burn: Box<dyn BurnLeg> = match args.request.source.kind() {
        ChainKind::Evm => Box::new(EvmBurnLeg::new(evm.clone())),
        ChainKind::Cosmos => Box::new(NobleBurnLeg::new(
            noble.clone(),
            Arc::new(routes.clone()),
        )),
    };

    let legs = Legs {
        allowance: Box::new(EvmAllowanceLeg::new(evm.clone())),
        burn,
        attestation: Box::new(AttestationPoller::new(
            &config.attestation.base_url,
            config.attestation.interval,
            config.attestation.max_attempts,
        )?),
        relay: Box::new(NobleRelayLeg::new(noble.clone())),
        watch: Box::new(BalanceWatcher::new(
            noble.clone(),
            config.watcher.interval,
            config.watcher.timeout,
        )),
        forward: Box::new(NobleForwardLeg::new(
            noble.clone(),
            ForwardConfig {
                channel: config.forward.channel.clone(),
                reserve: config.forward.reserve,
                timeout: config.forward.timeout,
            },
        )),
    };

    let mut orchestrator = Orchestrator::new(legs, hub_address, UUSDC.to_string());

    // Surface progress events independently of the engine's own logs, the
    // way a presentation layer would consume them.
    let mut events = orchestrator.event_stream();
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let TransferEvent::Failed {
                reason,
                funds_safe_pending,
            } = &event
            {
                warn!(reason = %reason, funds_safe_pending, "progress: transfer failed");
            } else {
                info!(event = ?event, "progress");
            }
        }
    });

    // Ctrl-C cancels in-flight polls instead of killing the process mid-leg.
    let (cancel_handle, cancel_token) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling transfer");
            cancel_handle.cancel();
        }
    });

    let result = match args.resume_tx_hash {
        Some(tx_hash) => {
            let receipt = BurnReceipt {
                source: args.request.source,
                tx_hash,
                created_at: Utc::now(),
            };
            orchestrator
                .resume(args.request, receipt, &cancel_token)
                .await
        }
        None => orchestrator.execute(args.request, &cancel_token).await,
    };

    match result {
        Ok(completed) => {
            info!(
                burn_tx = completed.receipt.as_ref().map(|r| r.tx_hash.as_str()),
                relay_tx = completed.relay.as_ref().map(|r| r.tx_hash.as_str()),
                forward_tx = completed.forward.as_ref().map(|r| r.tx_hash.as_str()),
                "Transfer completed"
            );
            Ok(())
        }
        Err(failure) => {
            if let Some(receipt) = &failure.receipt {
                warn!(
                    burn_tx = %receipt.tx_hash,
                    "Funds are burned and the credit is pending; resume with --resume {}",
                    receipt.tx_hash
                );
            }
            Err(eyre!("{}", failure))
        }
    }
}

fn parse_args() -> eyre::Result<CliArgs> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.len() < 4 {
        bail!(
            "usage: transit-orchestrator <SOURCE> <TARGET> <AMOUNT_UUSDC> <RECIPIENT> [--resume <BURN_TX_HASH>]"
        );
    }

    let source: Domain = args[0]
        .parse()
        .map_err(|e| eyre!("Bad source domain: {}", e))?;
    let target: Domain = args[1]
        .parse()
        .map_err(|e| eyre!("Bad target domain: {}", e))?;
    let amount: u128 = args[2]
        .parse()
        .wrap_err("AMOUNT_UUSDC must be an integer in base units")?;
    let recipient = args[3].clone();

    let resume_tx_hash = match args.iter().position(|a| a == "--resume") {
        Some(idx) => Some(
            args.get(idx + 1)
                .ok_or_else(|| eyre!("--resume requires a burn transaction hash"))?
                .clone(),
        ),
        None => None,
    };

    Ok(CliArgs {
        request: TransferRequest {
            source,
            target,
            recipient,
            amount,
        },
        resume_tx_hash,
    })
}

/// Initialize tracing/logging with structured output.
fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,transit_orchestrator=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}
