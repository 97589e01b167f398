//! Bundles the deterministic collaborators a scenario test needs: the
//! composition into one reproducible run is left to the test itself, this
//! just hands out the shared, wired-up parts.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rpcp_clock::VirtualClock;
use rpcp_paper::{PaperDex, PaperMarketData, PaperSigner};

pub struct Fixture {
    pub clock: Arc<VirtualClock>,
    pub market_data: Arc<PaperMarketData>,
    pub signer: Arc<PaperSigner>,
    pub dex: Arc<PaperDex>,
}

impl Fixture {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            clock: Arc::new(VirtualClock::new(start)),
            market_data: Arc::new(PaperMarketData::new()),
            signer: Arc::new(PaperSigner::new()),
            dex: Arc::new(PaperDex::new()),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        use rpcp_clock::Clock;
        self.clock.now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_now_matches_the_clock_start() {
        let start = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let fx = Fixture::new(start);
        assert_eq!(fx.now(), start);
    }
}
