//! §4.5 weighted risk score: `0.35*exposure + 0.25*drawdown + 0.20*var +
//! 0.10*concentration + 0.10*liquidity`, each component normalized so that
//! exceeding its limit saturates to 100.

#[derive(Clone, Copy, Debug, Default)]
pub struct ScoreComponents {
    pub exposure_pct: f64,
    pub exposure_limit_pct: f64,
    pub drawdown_pct: f64,
    pub drawdown_limit_pct: f64,
    pub var_1d: f64,
    pub var_reference: f64,
    pub concentration: f64,
    pub concentration_limit: f64,
    pub liquidity_ratio: f64,
    pub liquidity_threshold: f64,
}

/// `value / limit * 100`, clamped to `[0, 100]`. A non-positive limit means
/// the dimension is unconstrained and contributes 0.
fn normalize(value: f64, limit: f64) -> f64 {
    if limit <= 0.0 {
        return 0.0;
    }
    (value / limit * 100.0).clamp(0.0, 100.0)
}

pub fn risk_score(c: &ScoreComponents) -> f64 {
    let exposure_score = normalize(c.exposure_pct, c.exposure_limit_pct);
    let drawdown_score = normalize(c.drawdown_pct, c.drawdown_limit_pct);
    let var_score = normalize(c.var_1d, c.var_reference);
    let concentration_score = normalize(c.concentration, c.concentration_limit);
    let liquidity_score = normalize(c.liquidity_ratio, c.liquidity_threshold);

    0.35 * exposure_score
        + 0.25 * drawdown_score
        + 0.20 * var_score
        + 0.10 * concentration_score
        + 0.10 * liquidity_score
}
