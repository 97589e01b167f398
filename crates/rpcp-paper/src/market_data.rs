//! Deterministic mark-price source. Marks are set explicitly by the caller
//! (a scenario fixture or backtest replay driver) rather than generated, so
//! a test run is reproducible byte-for-byte across invocations.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rpcp_collab::{CollabResult, MarketDataProvider, PriceSeries};
use rpcp_schemas::Micros;

#[derive(Debug, Default)]
pub struct PaperMarketData {
    marks: Mutex<BTreeMap<String, Micros>>,
}

impl PaperMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets (or overwrites) the mark for `symbol`. Test/fixture setup only.
    pub fn set_mark(&self, symbol: &str, mark: Micros) {
        self.marks.lock().unwrap().insert(symbol.to_string(), mark);
    }
}

#[async_trait]
impl MarketDataProvider for PaperMarketData {
    async fn get_mark(&self, symbol: &str) -> CollabResult<Micros> {
        self.marks
            .lock()
            .unwrap()
            .get(symbol)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("no mark set for {symbol}"))
    }

    /// A flat series at the current mark, one close per `interval_secs` step
    /// from `from` to `to` inclusive. Good enough for deterministic
    /// volatility/drawdown math in tests; real history comes from a real
    /// market data collaborator, never this one.
    async fn get_candles(
        &self,
        symbol: &str,
        interval_secs: u64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> CollabResult<PriceSeries> {
        let mark = self.get_mark(symbol).await?;
        let interval_secs = interval_secs.max(1) as i64;
        let span_secs = (to - from).num_seconds().max(0);
        let steps = (span_secs / interval_secs) as usize + 1;
        Ok(PriceSeries {
            symbol: symbol.to_string(),
            closes: vec![mark; steps],
        })
    }
}
