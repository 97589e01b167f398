//! C1 — Clock & Scheduler.
//!
//! A uniform source of monotonic time, cancellable single-shot timers, and
//! periodic tickers with bounded jitter. No component reads wall time
//! directly; every loop driver holds an `Arc<dyn Clock>` and the test
//! harness substitutes [`VirtualClock`], which advances only on explicit
//! [`VirtualClock::advance`] calls.

mod ticker;
mod timer;
mod virtual_clock;

pub use ticker::Ticker;
pub use timer::{CancelToken, Timer};
pub use virtual_clock::VirtualClock;

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Monotonic-time source. `now()` must never go backwards within one
/// process lifetime (virtual or real).
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Sleep until `d` has elapsed according to this clock. For
    /// [`SystemClock`] this is a real sleep; for [`VirtualClock`] it
    /// resolves only once `advance` has moved time forward by `d`.
    fn sleep(&self, d: Duration) -> futures_util::future::BoxFuture<'static, ()>;
}

/// The real wall-clock implementation used in production.
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, d: Duration) -> futures_util::future::BoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(d))
    }
}

pub fn system_clock() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}
