//! Deterministic clock for tests. Time advances only on explicit
//! [`VirtualClock::advance`] calls; sleepers registered via `sleep` resolve
//! once enough virtual time has passed.

use crate::Clock;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

struct Shared {
    now: Mutex<DateTime<Utc>>,
    notify: Notify,
}

/// All internal state lives behind one `Arc<Shared>` so that futures
/// returned by `sleep` are `'static` regardless of how long the
/// `VirtualClock` value itself is borrowed for.
pub struct VirtualClock {
    shared: Arc<Shared>,
}

impl VirtualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            shared: Arc::new(Shared {
                now: Mutex::new(start),
                notify: Notify::new(),
            }),
        }
    }

    /// Advance virtual time by `d` and wake every sleeper whose deadline
    /// has now passed.
    pub fn advance(&self, d: Duration) {
        {
            let mut now = self.shared.now.lock().unwrap();
            *now += ChronoDuration::from_std(d).unwrap_or_else(|_| ChronoDuration::zero());
        }
        self.shared.notify.notify_waiters();
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.shared.now.lock().unwrap()
    }

    fn sleep(&self, d: Duration) -> futures_util::future::BoxFuture<'static, ()> {
        let shared = Arc::clone(&self.shared);
        let deadline = self.now() + ChronoDuration::from_std(d).unwrap_or_else(|_| ChronoDuration::zero());
        Box::pin(async move {
            loop {
                let reached = *shared.now.lock().unwrap() >= deadline;
                if reached {
                    return;
                }
                shared.notify.notified().await;
            }
        })
    }
}
