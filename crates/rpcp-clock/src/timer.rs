//! Cancellable single-shot timers.
//!
//! Cancellation is prompt: a waiter observes cancellation before the next
//! tick fires, implemented with `tokio::select!` racing the sleep against a
//! cancellation notification rather than polling a flag.

use crate::Clock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Clone)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        self.notify.notified().await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Timer;

/// Outcome of a timer wait: either the duration elapsed, or it was
/// cancelled first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOutcome {
    Elapsed,
    Cancelled,
}

impl Timer {
    /// Wait for `d` to elapse on `clock`, or for `token` to be cancelled,
    /// whichever comes first.
    pub async fn wait(clock: &Arc<dyn Clock>, d: Duration, token: &CancelToken) -> TimerOutcome {
        tokio::select! {
            _ = clock.sleep(d) => TimerOutcome::Elapsed,
            _ = token.cancelled() => TimerOutcome::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_is_not_cancelled() {
        let t = CancelToken::new();
        assert!(!t.is_cancelled());
        t.cancel();
        assert!(t.is_cancelled());
    }
}
