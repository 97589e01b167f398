//! C5 — Risk Assessor.
//!
//! Pure per-tick computation: given a snapshot of positions and the
//! resolved `RiskLimits` row for each scope, recompute `PositionRisk` /
//! `PortfolioRisk` and advance the alert book. No I/O: the caller (the
//! loop driver, wired up in the coordinator) owns the store read/write and
//! the ticker; this crate only computes.

pub mod alert;
pub mod score;
pub mod types;

pub use alert::{AlertBook, AlertEvent};
pub use types::{AssessmentInput, PositionSnapshot};

use chrono::{DateTime, Utc};
use rpcp_schemas::entities::{ActionKind, AlertKind, EntityType, PortfolioRisk, PositionRisk, RiskLimits, Severity};
use rpcp_schemas::Micros;
use score::ScoreComponents;

/// Step 2 of §4.5's tick: recompute one position's derived risk row.
pub fn assess_position(pos: &PositionSnapshot, var_confidence: f64, assessed_at: DateTime<Utc>) -> PositionRisk {
    let value = pos.value();
    let daily_vol = rpcp_metrics::volatility(&pos.closes);
    let var_1d = rpcp_metrics::value_at_risk_1d(daily_vol, value, var_confidence);
    let (mae_pct, mfe_pct) = rpcp_metrics::mae_mfe(pos.entry_price, &pos.path_since_entry);

    PositionRisk {
        position_id: pos.position_id,
        size: value,
        var_1d,
        exposure_pct: Micros::ZERO, // filled in by assess_portfolio once portfolio_value is known
        mae_pct: Micros::from_f64(mae_pct),
        mfe_pct: Micros::from_f64(mfe_pct),
        risk_score: Micros::ZERO, // filled in once exposure_pct is known
        assessed_at,
    }
}

/// Step 3 of §4.5's tick: aggregate position rows into the portfolio row,
/// and backfill each position's `exposure_pct` / `risk_score` now that the
/// portfolio value is known.
pub fn assess_portfolio(
    input: &AssessmentInput,
    position_risks: &mut [PositionRisk],
    limits: &RiskLimits,
) -> PortfolioRisk {
    let portfolio_value = input.portfolio_value;
    let pv = portfolio_value.to_f64().max(1e-9);

    let weights: Vec<f64> = position_risks.iter().map(|r| r.size.to_f64() / pv).collect();
    let concentration = rpcp_metrics::herfindahl_concentration(&weights);

    let total_var: f64 = position_risks.iter().map(|r| r.var_1d.to_f64()).sum();
    let weighted_beta: f64 = input
        .positions
        .iter()
        .zip(&weights)
        .map(|(p, w)| p.beta.to_f64() * w)
        .sum();

    let drawdown = rpcp_metrics::max_drawdown(&input.cumulative_pnl);
    let sharpe = rpcp_metrics::sharpe_ratio(&input.daily_returns, 0.0);

    for (risk, pos) in position_risks.iter_mut().zip(&input.positions) {
        let exposure_pct = risk.size.to_f64() / pv * 100.0;
        risk.exposure_pct = Micros::from_f64(exposure_pct);

        let position_weight = risk.size.to_f64() / pv;
        let components = ScoreComponents {
            exposure_pct,
            exposure_limit_pct: limits.max_portfolio_exposure_pct.to_f64(),
            drawdown_pct: drawdown * 100.0,
            drawdown_limit_pct: limits.max_drawdown_pct.to_f64(),
            var_1d: risk.var_1d.to_f64(),
            var_reference: limits.max_daily_loss.to_f64(),
            concentration: position_weight * position_weight * 10_000.0,
            concentration_limit: limits.concentration_limit_pct.to_f64() * 100.0,
            liquidity_ratio: if pos.avg_daily_volume.to_f64() > 0.0 {
                risk.size.to_f64() / pos.avg_daily_volume.to_f64()
            } else {
                0.0
            },
            liquidity_threshold: 1.0,
        };
        risk.risk_score = Micros::from_f64(score::risk_score(&components));
    }

    let portfolio_components = ScoreComponents {
        exposure_pct: 100.0 * total_var.abs() / pv.max(1.0),
        exposure_limit_pct: limits.max_portfolio_exposure_pct.to_f64(),
        drawdown_pct: drawdown * 100.0,
        drawdown_limit_pct: limits.max_drawdown_pct.to_f64(),
        var_1d: total_var,
        var_reference: limits.max_daily_loss.to_f64(),
        concentration,
        concentration_limit: limits.concentration_limit_pct.to_f64() * 100.0,
        liquidity_ratio: 0.0,
        liquidity_threshold: 1.0,
    };

    let return_series: Vec<Vec<f64>> = input.positions.iter().map(|p| rpcp_metrics::log_returns(&p.closes)).collect();
    let correlation = rpcp_metrics::max_pairwise_correlation(&return_series) * 100.0;

    PortfolioRisk {
        scope: limits.scope.clone(),
        portfolio_value,
        total_var_1d: Micros::from_f64(total_var),
        weighted_beta: Micros::from_f64(weighted_beta),
        concentration: Micros::from_f64(concentration),
        correlation: Micros::from_f64(correlation),
        drawdown_pct: Micros::from_f64(drawdown * 100.0),
        sharpe: Micros::from_f64(sharpe),
        risk_score: Micros::from_f64(score::risk_score(&portfolio_components)),
        assessed_at: input.assessed_at,
    }
}

/// Step 4 of §4.5's tick: compare each computed metric against the
/// resolved limits row and open/refresh/resolve alerts accordingly.
#[allow(clippy::too_many_arguments)]
pub fn evaluate_position_breaches(
    pos: &PositionSnapshot,
    risk: &PositionRisk,
    limits: &RiskLimits,
    liquidity_threshold: f64,
    now: DateTime<Utc>,
    hysteresis_margin_pct: f64,
    hysteresis_ticks: u32,
    book: &mut AlertBook,
) -> Vec<AlertEvent> {
    let mut events = Vec::new();
    let entity_id = pos.position_id.to_string();

    let exposure_limit = limits.max_portfolio_exposure_pct.to_f64();
    if risk.exposure_pct.to_f64() > exposure_limit && exposure_limit > 0.0 {
        events.push(book.record_breach(
            now,
            AlertKind::PositionSize,
            Severity::High,
            EntityType::Position,
            entity_id.clone(),
            risk.exposure_pct,
            limits.max_portfolio_exposure_pct,
            format!("position {} exposure {:.2}% exceeds {:.2}%", pos.symbol, risk.exposure_pct.to_f64(), exposure_limit),
            Some(ActionKind::PositionReduce),
        ));
    } else if let Some(ev) =
        alert::within_hysteresis_margin(risk.exposure_pct.to_f64(), exposure_limit, hysteresis_margin_pct)
            .then(|| book.record_in_bounds(now, AlertKind::PositionSize, &entity_id, hysteresis_ticks))
            .flatten()
    {
        events.push(ev);
    }

    if let Some(stop) = pos.stop_loss {
        let stop_pct = ((stop.to_f64() - pos.entry_price.to_f64()) / pos.entry_price.to_f64().max(1e-9)).abs() * 100.0;
        let pnl_pct = pos.unrealized_pnl_pct();
        if pnl_pct <= -stop_pct {
            events.push(book.record_breach(
                now,
                AlertKind::UnrealizedLoss,
                Severity::High,
                EntityType::Position,
                entity_id.clone(),
                Micros::from_f64(pnl_pct),
                Micros::from_f64(-stop_pct),
                format!("position {} hit stop-loss at {:.2}%", pos.symbol, pnl_pct),
                Some(ActionKind::PositionClose),
            ));
        }
    }

    let liquidity_ratio =
        if pos.avg_daily_volume.to_f64() > 0.0 { risk.size.to_f64() / pos.avg_daily_volume.to_f64() } else { 0.0 };
    if liquidity_ratio > liquidity_threshold && liquidity_threshold > 0.0 {
        events.push(book.record_breach(
            now,
            AlertKind::Liquidity,
            Severity::Medium,
            EntityType::Position,
            entity_id.clone(),
            Micros::from_f64(liquidity_ratio),
            Micros::from_f64(liquidity_threshold),
            format!("position {} size is {:.2}x its average daily volume", pos.symbol, liquidity_ratio),
            Some(ActionKind::NotifyOnly),
        ));
    } else if let Some(ev) = alert::within_hysteresis_margin(liquidity_ratio, liquidity_threshold, hysteresis_margin_pct)
        .then(|| book.record_in_bounds(now, AlertKind::Liquidity, &entity_id, hysteresis_ticks))
        .flatten()
    {
        events.push(ev);
    }

    events
}

/// Portfolio-level breach checks (drawdown, concentration, correlation,
/// daily loss).
#[allow(clippy::too_many_arguments)]
pub fn evaluate_portfolio_breaches(
    portfolio: &PortfolioRisk,
    limits: &RiskLimits,
    input: &AssessmentInput,
    now: DateTime<Utc>,
    hysteresis_margin_pct: f64,
    hysteresis_ticks: u32,
    book: &mut AlertBook,
) -> Vec<AlertEvent> {
    let mut events = Vec::new();
    let scope = limits.scope.clone();
    let entity_type = if scope.starts_with("strategy:") { EntityType::Strategy } else { EntityType::Portfolio };

    let drawdown_limit = limits.max_drawdown_pct.to_f64();
    if portfolio.drawdown_pct.to_f64() > drawdown_limit && drawdown_limit > 0.0 {
        events.push(book.record_breach(
            now,
            AlertKind::PortfolioDrawdown,
            Severity::Critical,
            EntityType::Portfolio,
            scope.clone(),
            portfolio.drawdown_pct,
            limits.max_drawdown_pct,
            format!("portfolio drawdown {:.2}% exceeds {:.2}%", portfolio.drawdown_pct.to_f64(), drawdown_limit),
            Some(ActionKind::EmergencyStop),
        ));
    } else if let Some(ev) = alert::within_hysteresis_margin(portfolio.drawdown_pct.to_f64(), drawdown_limit, hysteresis_margin_pct)
        .then(|| book.record_in_bounds(now, AlertKind::PortfolioDrawdown, &scope, hysteresis_ticks))
        .flatten()
    {
        events.push(ev);
    }

    let concentration_limit = limits.concentration_limit_pct.to_f64() * 100.0;
    if portfolio.concentration.to_f64() > concentration_limit && concentration_limit > 0.0 {
        events.push(book.record_breach(
            now,
            AlertKind::Concentration,
            Severity::High,
            EntityType::Portfolio,
            scope.clone(),
            portfolio.concentration,
            Micros::from_f64(concentration_limit),
            format!("portfolio concentration {:.0} exceeds {:.0}", portfolio.concentration.to_f64(), concentration_limit),
            Some(ActionKind::PositionReduce),
        ));
    } else if let Some(ev) = alert::within_hysteresis_margin(portfolio.concentration.to_f64(), concentration_limit, hysteresis_margin_pct)
        .then(|| book.record_in_bounds(now, AlertKind::Concentration, &scope, hysteresis_ticks))
        .flatten()
    {
        events.push(ev);
    }

    let correlation_limit = limits.correlation_limit.to_f64();
    if portfolio.correlation.to_f64() > correlation_limit && correlation_limit > 0.0 {
        events.push(book.record_breach(
            now,
            AlertKind::Correlation,
            Severity::Medium,
            EntityType::Portfolio,
            scope.clone(),
            portfolio.correlation,
            limits.correlation_limit,
            format!("portfolio max pairwise correlation {:.2}% exceeds {:.2}%", portfolio.correlation.to_f64(), correlation_limit),
            Some(ActionKind::NotifyOnly),
        ));
    } else if let Some(ev) = alert::within_hysteresis_margin(portfolio.correlation.to_f64(), correlation_limit, hysteresis_margin_pct)
        .then(|| book.record_in_bounds(now, AlertKind::Correlation, &scope, hysteresis_ticks))
        .flatten()
    {
        events.push(ev);
    }

    let daily_loss = (input.day_start_portfolio_value.to_f64() - portfolio.portfolio_value.to_f64()).max(0.0);
    let daily_loss_limit = limits.max_daily_loss.to_f64();
    if daily_loss > daily_loss_limit && daily_loss_limit > 0.0 {
        events.push(book.record_breach(
            now,
            AlertKind::StrategyDailyLoss,
            Severity::High,
            entity_type,
            scope.clone(),
            Micros::from_f64(daily_loss),
            limits.max_daily_loss,
            format!("{} daily loss {:.2} exceeds {:.2}", scope, daily_loss, daily_loss_limit),
            Some(ActionKind::StrategyPause),
        ));
    } else if let Some(ev) = alert::within_hysteresis_margin(daily_loss, daily_loss_limit, hysteresis_margin_pct)
        .then(|| book.record_in_bounds(now, AlertKind::StrategyDailyLoss, &scope, hysteresis_ticks))
        .flatten()
    {
        events.push(ev);
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    fn limits() -> RiskLimits {
        RiskLimits {
            scope: "global".into(),
            max_position_size: Micros::from_units(100_000),
            max_portfolio_exposure_pct: Micros::from_units(25),
            max_daily_loss: Micros::from_units(5_000),
            max_drawdown_pct: Micros::from_units(10),
            max_leverage: Micros::from_units(3),
            default_stop_loss_pct: Micros::from_units(5),
            default_take_profit_pct: Micros::from_units(10),
            concentration_limit_pct: Micros::from_units(60),
            correlation_limit: Micros::from_units(80),
        }
    }

    fn assessment_input(positions: Vec<PositionSnapshot>, portfolio_value: Micros) -> AssessmentInput {
        AssessmentInput {
            positions,
            portfolio_value,
            day_start_portfolio_value: portfolio_value,
            peak_portfolio_value: portfolio_value,
            cumulative_pnl: vec![portfolio_value],
            daily_returns: vec![],
            var_confidence_level: 0.95,
            assessed_at: now(),
        }
    }

    fn snapshot() -> PositionSnapshot {
        PositionSnapshot {
            position_id: Uuid::new_v4(),
            strategy_id: "s1".into(),
            symbol: "ETH".into(),
            quantity: Micros::from_units(10),
            entry_price: Micros::from_units(2_000),
            mark: Micros::from_units(2_000),
            stop_loss: None,
            closes: vec![Micros::from_units(2_000); 5],
            path_since_entry: vec![Micros::from_units(2_000)],
            beta: Micros::from_units(1),
            avg_daily_volume: Micros::from_units(1_000_000),
        }
    }

    #[test]
    fn assess_position_computes_value_and_var() {
        let risk = assess_position(&snapshot(), 0.95, now());
        assert_eq!(risk.size, Micros::from_units(20_000));
        assert_eq!(risk.var_1d, Micros::ZERO); // constant closes -> zero volatility -> zero VaR
    }

    #[test]
    fn assess_portfolio_backfills_exposure_and_score() {
        let pos = snapshot();
        let mut risks = vec![assess_position(&pos, 0.95, now())];
        let input = AssessmentInput {
            positions: vec![pos],
            portfolio_value: Micros::from_units(100_000),
            day_start_portfolio_value: Micros::from_units(100_000),
            peak_portfolio_value: Micros::from_units(100_000),
            cumulative_pnl: vec![Micros::from_units(100_000)],
            daily_returns: vec![],
            var_confidence_level: 0.95,
            assessed_at: now(),
        };
        let portfolio = assess_portfolio(&input, &mut risks, &limits());
        // 20_000 / 100_000 = 20%
        assert!((risks[0].exposure_pct.to_f64() - 20.0).abs() < 1e-6);
        assert_eq!(portfolio.portfolio_value, Micros::from_units(100_000));
    }

    #[test]
    fn exposure_breach_opens_position_size_alert() {
        let pos = snapshot();
        let mut risk = assess_position(&pos, 0.95, now());
        risk.exposure_pct = Micros::from_units(30); // above the 25% limit
        let mut book = AlertBook::new(vec![]);
        let events = evaluate_position_breaches(&pos, &risk, &limits(), 1.0, now(), 0.05, 3, &mut book);
        assert!(events.iter().any(|e| matches!(e, AlertEvent::Created(_))));
    }

    #[test]
    fn liquidity_breach_recommends_notify_only() {
        let mut pos = snapshot();
        pos.avg_daily_volume = Micros::from_units(1_000); // position value (20_000) dwarfs daily volume
        let risk = assess_position(&pos, 0.95, now());
        let mut book = AlertBook::new(vec![]);
        let events = evaluate_position_breaches(&pos, &risk, &limits(), 1.0, now(), 0.05, 3, &mut book);
        let created = events.iter().find_map(|e| match e {
            AlertEvent::Created(a) if a.kind == AlertKind::Liquidity => Some(a),
            _ => None,
        });
        assert_eq!(created.unwrap().recommended_action, Some(ActionKind::NotifyOnly));
    }

    #[test]
    fn stop_loss_breach_recommends_position_close() {
        let mut pos = snapshot();
        pos.stop_loss = Some(Micros::from_units(1_900)); // 5% stop
        pos.mark = Micros::from_units(1_880); // -6% move, past the stop
        let risk = assess_position(&pos, 0.95, now());
        let mut book = AlertBook::new(vec![]);
        let events = evaluate_position_breaches(&pos, &risk, &limits(), 1.0, now(), 0.05, 3, &mut book);
        let created = events.iter().find_map(|e| match e {
            AlertEvent::Created(a) => Some(a),
            _ => None,
        });
        assert_eq!(created.unwrap().recommended_action, Some(ActionKind::PositionClose));
    }

    #[test]
    fn portfolio_drawdown_breach_recommends_emergency_stop() {
        let mut portfolio_limits = limits();
        portfolio_limits.max_drawdown_pct = Micros::from_units(10);
        let portfolio = PortfolioRisk {
            scope: "global".into(),
            portfolio_value: Micros::from_units(80_000),
            total_var_1d: Micros::ZERO,
            weighted_beta: Micros::ZERO,
            concentration: Micros::ZERO,
            correlation: Micros::ZERO,
            drawdown_pct: Micros::from_units(15), // above the 10% limit
            sharpe: Micros::ZERO,
            risk_score: Micros::ZERO,
            assessed_at: now(),
        };
        let mut book = AlertBook::new(vec![]);
        let input = assessment_input(vec![], Micros::from_units(80_000));
        let events = evaluate_portfolio_breaches(&portfolio, &portfolio_limits, &input, now(), 0.05, 3, &mut book);
        let created = events.iter().find_map(|e| match e {
            AlertEvent::Created(a) => Some(a),
            _ => None,
        });
        assert_eq!(created.unwrap().recommended_action, Some(ActionKind::EmergencyStop));
    }

    #[test]
    fn correlation_breach_recommends_notify_only() {
        let portfolio_limits = limits(); // correlation_limit = 80
        let portfolio = PortfolioRisk {
            scope: "global".into(),
            portfolio_value: Micros::from_units(100_000),
            total_var_1d: Micros::ZERO,
            weighted_beta: Micros::ZERO,
            concentration: Micros::ZERO,
            correlation: Micros::from_units(90), // above the 80 limit
            drawdown_pct: Micros::ZERO,
            sharpe: Micros::ZERO,
            risk_score: Micros::ZERO,
            assessed_at: now(),
        };
        let mut book = AlertBook::new(vec![]);
        let input = assessment_input(vec![], Micros::from_units(100_000));
        let events = evaluate_portfolio_breaches(&portfolio, &portfolio_limits, &input, now(), 0.05, 3, &mut book);
        let created = events.iter().find_map(|e| match e {
            AlertEvent::Created(a) if a.kind == AlertKind::Correlation => Some(a),
            _ => None,
        });
        assert_eq!(created.unwrap().recommended_action, Some(ActionKind::NotifyOnly));
    }

    #[test]
    fn daily_loss_breach_recommends_strategy_pause() {
        let mut strategy_limits = limits();
        strategy_limits.scope = "strategy:s1".into();
        strategy_limits.max_daily_loss = Micros::from_units(5_000);
        let portfolio = PortfolioRisk {
            scope: "strategy:s1".into(),
            portfolio_value: Micros::from_units(90_000), // down 10_000 from day start
            total_var_1d: Micros::ZERO,
            weighted_beta: Micros::ZERO,
            concentration: Micros::ZERO,
            correlation: Micros::ZERO,
            drawdown_pct: Micros::ZERO,
            sharpe: Micros::ZERO,
            risk_score: Micros::ZERO,
            assessed_at: now(),
        };
        let mut book = AlertBook::new(vec![]);
        let mut input = assessment_input(vec![], Micros::from_units(90_000));
        input.day_start_portfolio_value = Micros::from_units(100_000);
        let events = evaluate_portfolio_breaches(&portfolio, &strategy_limits, &input, now(), 0.05, 3, &mut book);
        let created = events.iter().find_map(|e| match e {
            AlertEvent::Created(a) if a.kind == AlertKind::StrategyDailyLoss => Some(a),
            _ => None,
        });
        let created = created.unwrap();
        assert_eq!(created.recommended_action, Some(ActionKind::StrategyPause));
        assert_eq!(created.entity_type, EntityType::Strategy);
    }
}
