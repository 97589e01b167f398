use chrono::{DateTime, Utc};
use rpcp_schemas::Micros;
use uuid::Uuid;

/// A point-in-time view of one active position, as the assessor needs it.
/// Supplied by the caller (the store-reading driver); this crate never
/// talks to persistence directly.
#[derive(Clone, Debug)]
pub struct PositionSnapshot {
    pub position_id: Uuid,
    pub strategy_id: String,
    pub symbol: String,
    pub quantity: Micros,
    pub entry_price: Micros,
    pub mark: Micros,
    pub stop_loss: Option<Micros>,
    /// Recent closes, oldest first, used for volatility/VaR.
    pub closes: Vec<Micros>,
    /// Prices observed since entry, used for MAE/MFE.
    pub path_since_entry: Vec<Micros>,
    pub beta: Micros,
    /// Average daily volume in quote currency, used for the liquidity score.
    pub avg_daily_volume: Micros,
}

impl PositionSnapshot {
    pub fn value(&self) -> Micros {
        self.mark.mul_fraction(self.quantity).abs()
    }

    pub fn unrealized_pnl_pct(&self) -> f64 {
        let entry = self.entry_price.to_f64();
        if entry == 0.0 {
            return 0.0;
        }
        let sign = self.quantity.signum() as f64;
        ((self.mark.to_f64() - entry) / entry) * 100.0 * sign
    }
}

/// Everything a single assessment tick needs beyond the positions
/// themselves.
#[derive(Clone, Debug)]
pub struct AssessmentInput {
    pub positions: Vec<PositionSnapshot>,
    pub portfolio_value: Micros,
    pub day_start_portfolio_value: Micros,
    pub peak_portfolio_value: Micros,
    pub cumulative_pnl: Vec<Micros>,
    pub daily_returns: Vec<f64>,
    pub var_confidence_level: f64,
    pub assessed_at: DateTime<Utc>,
}
