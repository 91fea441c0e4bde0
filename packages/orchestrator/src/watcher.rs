//! Balance watching on the hub chain.
//!
//! A successful relay broadcast is necessary but not sufficient proof that
//! the mint credited the account: the credit is applied by the destination
//! chain's own message handler. The watcher captures a baseline balance and
//! polls until it moves in the expected direction.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use transit_multichain::noble::NobleClient;

use crate::error::TransferError;
use crate::poll::{poll_fixed, CancelToken, PollOutcome};

/// Expected direction of the balance movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Waiting for an incoming credit.
    Increase,
    /// Waiting for an outgoing debit.
    Decrease,
}

/// Poller for account balance changes on the hub chain.
pub struct BalanceWatcher {
    client: Arc<NobleClient>,
    interval: Duration,
    timeout: Duration,
}

impl BalanceWatcher {
    pub fn new(client: Arc<NobleClient>, interval: Duration, timeout: Duration) -> Self {
        Self {
            client,
            interval,
            timeout,
        }
    }

    /// Wait until the balance of `denom` at `address` moves in `direction`.
    ///
    /// The baseline is captured at call time. Resolves `Ready(new_balance)`
    /// on a matching move, `TimedOut` once the budget elapses (with the real
    /// elapsed time, at least the budget), or `Cancelled`.
    pub async fn await_change(
        &self,
        address: &str,
        denom: &str,
        direction: Direction,
        cancel: &CancelToken,
    ) -> Result<PollOutcome<u128>, TransferError> {
        let baseline = self.client.balance(address, denom).await?;

        debug!(address = %address, denom = %denom, baseline, ?direction, "Watching balance");

        let max_attempts = self.timeout.as_millis().div_ceil(self.interval.as_millis().max(1))
            .max(1) as u32;

        let outcome = poll_fixed(self.interval, max_attempts, cancel, |attempt| {
            let address = address.to_string();
            let denom = denom.to_string();
            let client = self.client.clone();
            async move {
                match client.balance(&address, &denom).await {
                    Ok(current) => {
                        let moved = match direction {
                            Direction::Increase => current > baseline,
                            Direction::Decrease => current < baseline,
                        };
                        if moved {
                            debug!(address = %address, baseline, current, "Balance moved");
                            Ok(Some(current))
                        } else {
                            Ok(None)
                        }
                    }
                    Err(e) => {
                        // A flaky LCD read should not abort the wait; the
                        // timeout budget bounds how long we tolerate it.
                        warn!(address = %address, attempt, error = %e, "Balance query failed");
                        Ok::<_, TransferError>(None)
                    }
                }
            }
        })
        .await?;

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transit_multichain::noble::{MnemonicSigner, NobleClientConfig};
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_MNEMONIC: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn test_watcher(lcd_url: String, interval_ms: u64, timeout_ms: u64) -> BalanceWatcher {
        let signer = MnemonicSigner::new(TEST_MNEMONIC, "noble").unwrap();
        let client = NobleClient::new(
            NobleClientConfig {
                lcd_url,
                ..NobleClientConfig::default()
            },
            Box::new(signer),
        )
        .unwrap();

        BalanceWatcher::new(
            Arc::new(client),
            Duration::from_millis(interval_ms),
            Duration::from_millis(timeout_ms),
        )
    }

    fn balance_body(amount: &str) -> serde_json::Value {
        serde_json::json!({"balances": [{"denom": "uusdc", "amount": amount}]})
    }

    #[tokio::test]
    async fn test_resolves_on_increase() {
        let server = MockServer::start().await;

        // Baseline read plus one unchanged poll, then the credit lands.
        Mock::given(method("GET"))
            .and(path_regex(r"^/cosmos/bank/v1beta1/balances/.*$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(balance_body("100")))
            .up_to_n_times(2)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/cosmos/bank/v1beta1/balances/.*$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(balance_body("250")))
            .mount(&server)
            .await;

        let watcher = test_watcher(server.uri(), 5, 500);
        let (_handle, token) = crate::poll::cancel_pair();

        let outcome = watcher
            .await_change("noble1abc", "uusdc", Direction::Increase, &token)
            .await
            .unwrap();

        assert_eq!(outcome, PollOutcome::Ready(250));
    }

    #[tokio::test]
    async fn test_increase_does_not_resolve_on_decrease() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/cosmos/bank/v1beta1/balances/.*$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(balance_body("100")))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/cosmos/bank/v1beta1/balances/.*$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(balance_body("40")))
            .mount(&server)
            .await;

        let timeout = Duration::from_millis(50);
        let watcher = test_watcher(server.uri(), 5, timeout.as_millis() as u64);
        let (_handle, token) = crate::poll::cancel_pair();

        let outcome = watcher
            .await_change("noble1abc", "uusdc", Direction::Increase, &token)
            .await
            .unwrap();

        match outcome {
            PollOutcome::TimedOut { waited } => assert!(waited >= timeout),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_decrease_direction_resolves_on_debit() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/cosmos/bank/v1beta1/balances/.*$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(balance_body("100")))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/cosmos/bank/v1beta1/balances/.*$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(balance_body("40")))
            .mount(&server)
            .await;

        let watcher = test_watcher(server.uri(), 5, 500);
        let (_handle, token) = crate::poll::cancel_pair();

        let outcome = watcher
            .await_change("noble1abc", "uusdc", Direction::Decrease, &token)
            .await
            .unwrap();

        assert_eq!(outcome, PollOutcome::Ready(40));
    }

    #[tokio::test]
    async fn test_unchanged_balance_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/cosmos/bank/v1beta1/balances/.*$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(balance_body("100")))
            .mount(&server)
            .await;

        let timeout = Duration::from_millis(40);
        let watcher = test_watcher(server.uri(), 5, timeout.as_millis() as u64);
        let (_handle, token) = crate::poll::cancel_pair();

        let outcome = watcher
            .await_change("noble1abc", "uusdc", Direction::Increase, &token)
            .await
            .unwrap();

        match outcome {
            PollOutcome::TimedOut { waited } => assert!(waited >= timeout),
            other => panic!("expected timeout, got {:?}", other),
        }
    }
}
