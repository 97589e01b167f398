//! Periodic tickers with bounded jitter, to avoid a thundering herd across
//! independently scheduled loops (assessment, action-planner, executor,
//! balance-snapshot, gas-drip, sweeper, rebalancer all tick on their own
//! intervals).

use crate::timer::{CancelToken, Timer, TimerOutcome};
use crate::Clock;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

pub struct Ticker {
    clock: Arc<dyn Clock>,
    interval: Duration,
    jitter: Duration,
    token: CancelToken,
}

impl Ticker {
    pub fn new(clock: Arc<dyn Clock>, interval: Duration, jitter: Duration) -> Self {
        Self {
            clock,
            interval,
            jitter,
            token: CancelToken::new(),
        }
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Wait for the next tick. Returns `None` if the ticker was cancelled
    /// before the tick fired.
    pub async fn tick(&self) -> Option<()> {
        let delay = if self.jitter.is_zero() {
            self.interval
        } else {
            let jitter_ms = self.jitter.as_millis() as u64;
            let offset = if jitter_ms == 0 {
                0
            } else {
                rand::thread_rng().gen_range(0..=jitter_ms)
            };
            self.interval + Duration::from_millis(offset)
        };

        match Timer::wait(&self.clock, delay, &self.token).await {
            TimerOutcome::Elapsed => Some(()),
            TimerOutcome::Cancelled => None,
        }
    }
}
