//! Cancellable fixed-interval polling.
//!
//! Replaces free-standing timer handles with a single primitive: a poll loop
//! that sleeps, attempts, and repeats until the attempt yields a value, the
//! attempt budget runs out, or the shared cancellation token fires. Every
//! polling component in the orchestrator is built on this.

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::sync::watch;

/// Result of a bounded poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// The condition was met.
    Ready(T),
    /// The attempt budget elapsed without the condition being met.
    /// `waited` is the real elapsed time, at least the configured budget.
    TimedOut { waited: Duration },
    /// The caller cancelled the poll; no further attempts were made.
    Cancelled,
}

impl<T> PollOutcome<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, PollOutcome::Ready(_))
    }
}

/// Cancellation side held by the caller.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Cancellation token observed inside poll loops.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves when the handle fires. If the handle is dropped without
    /// cancelling, this never resolves.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Create a linked cancel handle/token pair.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

/// Poll `attempt` every `interval`, at most `max_attempts` times.
///
/// The attempt closure returns `Ok(Some(value))` when the condition is met,
/// `Ok(None)` to keep waiting, or `Err` to abort the poll with that error.
/// The first attempt runs after one full interval, matching the behavior of
/// an interval timer.
pub async fn poll_fixed<T, E, F, Fut>(
    interval: Duration,
    max_attempts: u32,
    cancel: &CancelToken,
    mut attempt: F,
) -> Result<PollOutcome<T>, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let start = Instant::now();

    for n in 1..=max_attempts {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled),
            _ = tokio::time::sleep(interval) => {}
        }

        if cancel.is_cancelled() {
            return Ok(PollOutcome::Cancelled);
        }

        if let Some(value) = attempt(n).await? {
            return Ok(PollOutcome::Ready(value));
        }
    }

    Ok(PollOutcome::TimedOut {
        waited: start.elapsed(),
    })
}
