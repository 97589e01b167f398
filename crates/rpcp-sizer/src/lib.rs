//! C4 — Position Sizer.
//!
//! Pure function over a symbol's method inputs and the sizing configuration.
//! No I/O: callers supply whatever price history or portfolio stats the
//! chosen method needs. `size` never returns a negative quantity.

use rpcp_config::tree::SizingConfig;
use rpcp_schemas::Micros;
use std::collections::BTreeMap;

/// Everything `size` may need, by method. Fields unused by the resolved
/// method are simply ignored.
#[derive(Clone, Debug)]
pub struct SizingRequest {
    pub symbol: String,
    pub portfolio_value: Micros,
    pub entry_price: Micros,
    pub stop_loss: Option<Micros>,
    pub confidence: Option<f64>,
    /// Recent closes for `symbol`, oldest first, used by `volatility` sizing
    /// and as the realized-variance input to `risk_parity` (Open Question b).
    pub closes: Vec<Micros>,
    /// (avg_win, avg_loss, win_rate) over `kelly_lookback`, used by `kelly`.
    pub kelly_stats: Option<(Micros, Micros, f64)>,
    /// Per-asset realized variance across the portfolio's held symbols,
    /// used by `risk_parity` to derive an equal-variance-contribution weight
    /// for `symbol`. Must include an entry for `symbol` itself.
    pub portfolio_variances: BTreeMap<String, f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizingError {
    /// `percentage` fallback also lacks the inputs it needs — should not
    /// happen given a well-formed `SizingConfig`, but guards against one
    /// that configures `portfolio_percentage` as non-finite.
    InvalidConfig,
}

/// §4.4 sizing contract. `method_override` lets callers force a method
/// other than `config.method` (e.g. operator manual-size calc); `None`
/// uses the configured default.
pub fn size(
    req: &SizingRequest,
    config: &SizingConfig,
    method_override: Option<rpcp_config::tree::SizingMethod>,
) -> Result<Micros, SizingError> {
    use rpcp_config::tree::SizingMethod::*;

    let method = method_override.unwrap_or(config.method);
    let base = base_size(req, config, method)?;

    let capped = match req.stop_loss {
        Some(stop) if req.entry_price.raw() != 0 => {
            let entry = req.entry_price.to_f64();
            let stop_distance = (entry - stop.to_f64()).abs() / entry;
            if stop_distance > 0.0 {
                let max_size = req.portfolio_value.to_f64() * config.per_trade_risk_pct / 100.0 / stop_distance;
                base.min(max_size)
            } else {
                base
            }
        }
        _ => base,
    };

    let confidence_scaled = match req.confidence {
        Some(c) => capped * (c / 100.0).min(1.0).max(0.0),
        None => capped,
    };

    let portfolio_cap = req.portfolio_value.to_f64() * 0.20;
    let floored = if confidence_scaled > 0.0 {
        confidence_scaled.max(config.min_size.to_f64())
    } else {
        confidence_scaled
    };
    let absolute_capped = floored.min(config.max_size.to_f64()).min(portfolio_cap);

    Ok(Micros::from_f64(absolute_capped.max(0.0)))
}

/// Step 1 of §4.4: select base size by method, applying the two named
/// fallbacks (undefined Kelly -> percentage; missing volatility -> fixed).
fn base_size(
    req: &SizingRequest,
    config: &SizingConfig,
    method: rpcp_config::tree::SizingMethod,
) -> Result<f64, SizingError> {
    use rpcp_config::tree::SizingMethod::*;

    let portfolio = req.portfolio_value.to_f64();

    match method {
        Fixed => Ok(config.base_size.to_f64() * config.size_multiplier),
        Percentage => {
            if !config.portfolio_percentage.is_finite() {
                return Err(SizingError::InvalidConfig);
            }
            Ok(portfolio * config.portfolio_percentage / 100.0 * config.size_multiplier)
        }
        Volatility => {
            let vol = rpcp_metrics::volatility(&req.closes);
            if vol <= 0.0 {
                // missing volatility -> fixed
                base_size(req, config, Fixed)
            } else {
                let target_risk = config.portfolio_percentage / 100.0;
                Ok(portfolio * target_risk / vol * config.size_multiplier)
            }
        }
        Kelly => match req.kelly_stats {
            Some((avg_win, avg_loss, win_rate)) => {
                match rpcp_metrics::kelly_fraction(avg_win, avg_loss, win_rate, 0.25) {
                    Some(f) => Ok(portfolio * f * config.size_multiplier),
                    None => base_size(req, config, Percentage),
                }
            }
            None => base_size(req, config, Percentage),
        },
        RiskParity => Ok(risk_parity_base(portfolio, &req.symbol, &req.portfolio_variances)),
    }
}

/// Equal-variance-contribution weight: symbol weight is inversely
/// proportional to its realized variance, normalized across the held
/// universe (a standard approximation to true risk parity used when only
/// single-asset variances, not the full covariance matrix, are available).
fn risk_parity_base(portfolio_value: f64, symbol: &str, variances: &BTreeMap<String, f64>) -> f64 {
    let inv_vols: BTreeMap<&str, f64> = variances
        .iter()
        .filter(|(_, v)| **v > 0.0)
        .map(|(s, v)| (s.as_str(), 1.0 / v.sqrt()))
        .collect();
    let total: f64 = inv_vols.values().sum();
    if total <= 0.0 {
        return 0.0;
    }
    let weight = inv_vols.get(symbol).copied().unwrap_or(0.0) / total;
    portfolio_value * weight
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpcp_config::tree::SizingMethod;

    fn config() -> SizingConfig {
        SizingConfig {
            method: SizingMethod::Fixed,
            base_size: Micros::from_units(1_000),
            max_size: Micros::from_units(50_000),
            portfolio_percentage: 2.0,
            volatility_lookback: 20,
            kelly_lookback: 50,
            risk_free_rate: 0.0,
            max_leverage: Micros::from_units(3),
            size_multiplier: 1.0,
            per_trade_risk_pct: 1.0,
            min_size: Micros::from_units(10),
        }
    }

    fn req() -> SizingRequest {
        SizingRequest {
            symbol: "ETH".into(),
            portfolio_value: Micros::from_units(100_000),
            entry_price: Micros::from_units(2_000),
            stop_loss: None,
            confidence: None,
            closes: vec![],
            kelly_stats: None,
            portfolio_variances: BTreeMap::new(),
        }
    }

    #[test]
    fn fixed_method_uses_base_size() {
        let got = size(&req(), &config(), None).unwrap();
        assert_eq!(got, Micros::from_units(1_000));
    }

    #[test]
    fn percentage_method_scales_portfolio() {
        let cfg = config();
        let got = size(&req(), &cfg, Some(SizingMethod::Percentage)).unwrap();
        // 100_000 * 2% = 2_000
        assert_eq!(got, Micros::from_units(2_000));
    }

    #[test]
    fn stop_loss_clamps_to_per_trade_risk_cap() {
        let mut r = req();
        r.stop_loss = Some(Micros::from_units(1_900)); // 5% below entry
        let mut cfg = config();
        cfg.base_size = Micros::from_units(1_000_000); // force base size above the cap
        cfg.max_size = Micros::from_units(1_000_000);
        // per_trade_risk_pct=1% -> maxSize = 100_000 * 0.01 / 0.05 = 20_000
        let got = size(&r, &cfg, Some(SizingMethod::Fixed)).unwrap();
        assert_eq!(got, Micros::from_units(20_000));
    }

    #[test]
    fn confidence_scales_down_size() {
        let mut r = req();
        r.confidence = Some(50.0);
        let got = size(&r, &config(), Some(SizingMethod::Fixed)).unwrap();
        assert_eq!(got, Micros::from_units(500));
    }

    #[test]
    fn confidence_above_100_is_not_amplified() {
        let mut r = req();
        r.confidence = Some(150.0);
        let got = size(&r, &config(), Some(SizingMethod::Fixed)).unwrap();
        assert_eq!(got, Micros::from_units(1_000));
    }

    #[test]
    fn result_never_exceeds_twenty_percent_of_portfolio() {
        let mut cfg = config();
        cfg.base_size = Micros::from_units(500_000);
        cfg.max_size = Micros::from_units(500_000);
        let got = size(&req(), &cfg, Some(SizingMethod::Fixed)).unwrap();
        assert_eq!(got, Micros::from_units(20_000)); // 20% of 100_000
    }

    #[test]
    fn result_respects_absolute_min_size() {
        let mut cfg = config();
        cfg.base_size = Micros::from_units(1);
        cfg.min_size = Micros::from_units(50);
        let got = size(&req(), &cfg, Some(SizingMethod::Fixed)).unwrap();
        assert_eq!(got, Micros::from_units(50));
    }

    #[test]
    fn missing_volatility_falls_back_to_fixed() {
        let got = size(&req(), &config(), Some(SizingMethod::Volatility)).unwrap();
        assert_eq!(got, Micros::from_units(1_000));
    }

    #[test]
    fn undefined_kelly_falls_back_to_percentage() {
        let mut r = req();
        r.kelly_stats = Some((Micros::from_units(10), Micros::ZERO, 0.6));
        let got = size(&r, &config(), Some(SizingMethod::Kelly)).unwrap();
        // falls back to percentage: 100_000 * 2% = 2_000
        assert_eq!(got, Micros::from_units(2_000));
    }

    #[test]
    fn kelly_method_uses_quarter_kelly_fraction() {
        let mut r = req();
        r.kelly_stats = Some((Micros::from_units(200), Micros::from_units(100), 0.6));
        let got = size(&r, &config(), Some(SizingMethod::Kelly)).unwrap();
        // b=2, p=0.6 -> raw=0.4, quarter-kelly=0.1 -> 100_000*0.1=10_000
        assert_eq!(got, Micros::from_units(10_000));
    }

    #[test]
    fn risk_parity_weights_inversely_to_variance() {
        let mut r = req();
        r.portfolio_variances.insert("ETH".into(), 0.04); // vol 0.2
        r.portfolio_variances.insert("BTC".into(), 0.01); // vol 0.1
        let got = size(&r, &config(), Some(SizingMethod::RiskParity)).unwrap();
        // inv_vol(ETH)=5, inv_vol(BTC)=10, total=15 -> weight=5/15=1/3 -> 100_000/3
        let expected = 100_000.0 / 3.0;
        assert!((got.to_f64() - expected).abs() < 1.0);
    }

    #[test]
    fn risk_parity_with_no_variance_data_is_zero() {
        let got = size(&req(), &config(), Some(SizingMethod::RiskParity)).unwrap();
        assert_eq!(got, Micros::ZERO);
    }

    #[test]
    fn size_is_never_negative() {
        let mut cfg = config();
        cfg.min_size = Micros::ZERO;
        cfg.base_size = Micros::ZERO;
        let got = size(&req(), &cfg, Some(SizingMethod::Fixed)).unwrap();
        assert!(got.raw() >= 0);
    }
}
