//! C3 — Metrics Math.
//!
//! Pure, deterministic functions over price/PnL series. No I/O, no clock.
//! This is the only place in the system that may touch `f64` numeric
//! primitives directly (statistics need real division and roots); every
//! input and output at the boundary is a [`rpcp_schemas::Micros`] so
//! callers never pass raw floats across the component seam.

mod normal;

pub use normal::inverse_normal_cdf;

use rpcp_schemas::Micros;

/// Daily log returns over `closes`, oldest first. Non-positive closes are
/// dropped from the window they'd produce a return for.
pub fn log_returns(closes: &[Micros]) -> Vec<f64> {
    closes
        .windows(2)
        .filter_map(|w| {
            let (a, b) = (w[0].to_f64(), w[1].to_f64());
            if a <= 0.0 || b <= 0.0 {
                None
            } else {
                Some((b / a).ln())
            }
        })
        .collect()
}

/// Daily log-return volatility (standard deviation) over `closes`. Returns
/// 0 when fewer than 2 observations are given.
pub fn volatility(closes: &[Micros]) -> f64 {
    if closes.len() < 2 {
        return 0.0;
    }
    std_dev(&log_returns(closes))
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        0.0
    } else {
        xs.iter().sum::<f64>() / xs.len() as f64
    }
}

fn std_dev(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let m = mean(xs);
    let variance = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (xs.len() - 1) as f64;
    variance.sqrt()
}

/// 1-day Value-at-Risk at confidence `c` (default 0.95). Negative results
/// are clamped to zero per §4.3.
pub fn value_at_risk_1d(daily_volatility: f64, position_value: Micros, confidence: f64) -> Micros {
    let z = inverse_normal_cdf(confidence);
    let var = z * daily_volatility * position_value.to_f64();
    if var < 0.0 {
        Micros::ZERO
    } else {
        Micros::from_f64(var)
    }
}

/// Maximum adverse / favorable excursion since entry, as positive
/// percentages relative to `entry`.
pub fn mae_mfe(entry: Micros, prices_since_entry: &[Micros]) -> (f64, f64) {
    let e = entry.to_f64();
    if e == 0.0 || prices_since_entry.is_empty() {
        return (0.0, 0.0);
    }
    let mut mae = 0.0_f64;
    let mut mfe = 0.0_f64;
    for p in prices_since_entry {
        let pct = (p.to_f64() - e) / e * 100.0;
        if pct < 0.0 {
            mae = mae.max(-pct);
        } else {
            mfe = mfe.max(pct);
        }
    }
    (mae, mfe)
}

/// Unrealized PnL / MFE, range [-1, 1]. Undefined (MFE = 0) treated as 0.
pub fn efficiency_ratio(unrealized_pnl_pct: f64, mfe_pct: f64) -> f64 {
    if mfe_pct == 0.0 {
        0.0
    } else {
        (unrealized_pnl_pct / mfe_pct).clamp(-1.0, 1.0)
    }
}

/// Sharpe ratio: mean excess return over `risk_free_rate` divided by total
/// deviation, annualized by sqrt(252).
pub fn sharpe_ratio(daily_returns: &[f64], risk_free_rate_daily: f64) -> f64 {
    if daily_returns.is_empty() {
        return 0.0;
    }
    let excess: Vec<f64> = daily_returns.iter().map(|r| r - risk_free_rate_daily).collect();
    let sd = std_dev(&excess);
    if sd == 0.0 {
        return 0.0;
    }
    mean(&excess) / sd * (252.0_f64).sqrt()
}

/// Sortino ratio: like Sharpe, but the denominator only counts downside
/// deviation (returns below the target).
pub fn sortino_ratio(daily_returns: &[f64], risk_free_rate_daily: f64) -> f64 {
    if daily_returns.is_empty() {
        return 0.0;
    }
    let excess: Vec<f64> = daily_returns.iter().map(|r| r - risk_free_rate_daily).collect();
    let downside: Vec<f64> = excess.iter().copied().filter(|r| *r < 0.0).collect();
    if downside.is_empty() {
        return 0.0;
    }
    let downside_dev = (downside.iter().map(|r| r.powi(2)).sum::<f64>() / downside.len() as f64).sqrt();
    if downside_dev == 0.0 {
        return 0.0;
    }
    mean(&excess) / downside_dev * (252.0_f64).sqrt()
}

/// Largest peak-to-trough fractional decline of a cumulative PnL series.
/// Returns a value in [0, 1].
pub fn max_drawdown(cumulative_pnl: &[Micros]) -> f64 {
    if cumulative_pnl.is_empty() {
        return 0.0;
    }
    let mut peak = cumulative_pnl[0].to_f64();
    let mut worst = 0.0_f64;
    for v in cumulative_pnl {
        let v = v.to_f64();
        if v > peak {
            peak = v;
        }
        if peak > 0.0 {
            let dd = (peak - v) / peak;
            if dd > worst {
                worst = dd;
            }
        }
    }
    worst
}

fn pearson_correlation(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len().min(b.len());
    if n < 2 {
        return None;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let (ma, mb) = (mean(a), mean(b));
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for i in 0..n {
        let (da, db) = (a[i] - ma, b[i] - mb);
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    if var_a <= 0.0 || var_b <= 0.0 {
        return None;
    }
    Some(cov / (var_a.sqrt() * var_b.sqrt()))
}

/// Maximum pairwise absolute correlation across a set of return series,
/// one per held position. Pairs with fewer than 2 overlapping observations,
/// or zero variance in either leg, are skipped. Returns 0 for fewer than
/// two series.
pub fn max_pairwise_correlation(return_series: &[Vec<f64>]) -> f64 {
    let mut worst = 0.0_f64;
    for i in 0..return_series.len() {
        for j in (i + 1)..return_series.len() {
            if let Some(rho) = pearson_correlation(&return_series[i], &return_series[j]) {
                worst = worst.max(rho.abs());
            }
        }
    }
    worst
}

/// Herfindahl concentration index: sum of squared position weights × 10000.
/// `weights` are fractions of portfolio value in [0, 1] and need not sum to
/// exactly 1 (cash/unallocated is simply excluded).
pub fn herfindahl_concentration(weights: &[f64]) -> f64 {
    weights.iter().map(|w| w * w).sum::<f64>() * 10_000.0
}

/// Kelly fraction `(b*p - (1-p)) / b`, clamped to >= 0 and scaled by
/// `safety_factor` (quarter-Kelly default = 0.25). `avg_loss == 0` is
/// undefined and the caller must fall back to `percentage` sizing per
/// §4.4's edge case.
pub fn kelly_fraction(avg_win: Micros, avg_loss: Micros, win_rate: f64, safety_factor: f64) -> Option<f64> {
    if avg_loss.raw() == 0 {
        return None;
    }
    let b = avg_win.to_f64() / avg_loss.abs().to_f64();
    if b <= 0.0 {
        return Some(0.0);
    }
    let p = win_rate.clamp(0.0, 1.0);
    let raw = (b * p - (1.0 - p)) / b;
    Some(raw.max(0.0) * safety_factor)
}

/// Partial-exit ladder: given ascending thresholds and current unrealized
/// PnL percentage `x`, returns `25*k` capped at 75, `k` = count of
/// thresholds `<= x`.
pub fn partial_exit_ladder(thresholds: &[f64], x: f64) -> f64 {
    let k = thresholds.iter().filter(|t| **t <= x).count() as f64;
    (25.0 * k).min(75.0)
}
