//! §4.8 "Rebalancer loop": compares current per-asset allocation against
//! `rebalance_target` and emits capped trades for assets that have drifted
//! past `tolerance_band`, largest drift first.

use chrono::{DateTime, Utc};
use rpcp_config::tree::FundsConfig;
use rpcp_schemas::entities::{FundJob, FundJobKind, RebalanceTrade, Side, WalletGroup};
use rpcp_schemas::Micros;
use std::collections::BTreeMap;
use uuid::Uuid;

/// `current_allocation` is each asset's quoted value in the reference
/// currency. `target` is `asset -> target percentage` (0-100).
pub fn plan_rebalance(
    wallet_group: WalletGroup,
    current_allocation: &BTreeMap<String, Micros>,
    target: &BTreeMap<String, f64>,
    config: &FundsConfig,
    now: DateTime<Utc>,
) -> Option<FundJob> {
    let total: f64 = current_allocation.values().map(|v| v.to_f64()).sum();
    if total <= 0.0 {
        return None;
    }

    let mut assets: Vec<&String> = current_allocation.keys().chain(target.keys()).collect();
    assets.sort();
    assets.dedup();

    let mut drifts: Vec<(String, f64)> = assets
        .into_iter()
        .map(|asset| {
            let current_pct = current_allocation.get(asset).map(|v| v.to_f64()).unwrap_or(0.0) / total * 100.0;
            let target_pct = target.get(asset).copied().unwrap_or(0.0);
            (asset.clone(), current_pct - target_pct)
        })
        .collect();

    let max_abs_drift = drifts.iter().map(|(_, d)| d.abs()).fold(0.0_f64, f64::max);
    if max_abs_drift <= config.tolerance_band {
        return None;
    }

    drifts.sort_by(|a, b| b.1.abs().partial_cmp(&a.1.abs()).unwrap());

    let max_trade = config.max_single_trade_usd.to_f64();
    let min_trade = config.min_rebalance_value_usd.to_f64();

    let trades: Vec<RebalanceTrade> = drifts
        .into_iter()
        .filter_map(|(asset, drift_pct)| {
            let raw_value = drift_pct.abs() / 100.0 * total;
            let capped = raw_value.min(max_trade);
            if capped < min_trade {
                return None;
            }
            // Over-allocated (positive drift) sells down; under-allocated buys up.
            let side = if drift_pct > 0.0 { Side::Short } else { Side::Long };
            Some(RebalanceTrade { asset, side, amount: Micros::from_f64(capped) })
        })
        .collect();

    if trades.is_empty() {
        return None;
    }

    Some(FundJob {
        id: Uuid::new_v4(),
        kind: FundJobKind::Rebalance { wallet_group, trades },
        status: if config.rebalancer.dry_run {
            rpcp_schemas::entities::FundJobStatus::Completed
        } else {
            rpcp_schemas::entities::FundJobStatus::Pending
        },
        created_at: now,
        executed_at: if config.rebalancer.dry_run { Some(now) } else { None },
        tx_ref: None,
        dry_run: config.rebalancer.dry_run,
        error: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpcp_config::tree::SubLoopConfig;

    fn config(tolerance: f64) -> FundsConfig {
        FundsConfig {
            min_gas: Micros::from_f64(0.05),
            max_gas: Micros::from_f64(0.2),
            sweep_min: Micros::from_units(100),
            leaving_amount: Micros::from_units(5),
            rebalance_target: BTreeMap::new(),
            tolerance_band: tolerance,
            treasury_address: "treasury".into(),
            managed_wallet_groups: vec!["hot".into()],
            supported_assets: vec!["BNB".into(), "USDT".into(), "WBNB".into()],
            balance_check_interval_ms: 30_000,
            gas_drip: SubLoopConfig { check_interval_ms: 60_000, max_concurrent: 5, dry_run: false },
            sweeper: SubLoopConfig { check_interval_ms: 60_000, max_concurrent: 5, dry_run: false },
            rebalancer: SubLoopConfig { check_interval_ms: 300_000, max_concurrent: 1, dry_run: false },
            min_rebalance_value_usd: Micros::from_units(50),
            max_single_trade_usd: Micros::from_units(10_000),
        }
    }

    fn allocation(bnb: i64, usdt: i64, wbnb: i64) -> BTreeMap<String, Micros> {
        let mut m = BTreeMap::new();
        m.insert("BNB".to_string(), Micros::from_units(bnb));
        m.insert("USDT".to_string(), Micros::from_units(usdt));
        m.insert("WBNB".to_string(), Micros::from_units(wbnb));
        m
    }

    fn target() -> BTreeMap<String, f64> {
        let mut m = BTreeMap::new();
        m.insert("BNB".to_string(), 30.0);
        m.insert("USDT".to_string(), 50.0);
        m.insert("WBNB".to_string(), 20.0);
        m
    }

    #[test]
    fn inside_tolerance_emits_no_job() {
        // allocation 31/49/20 against target 30/50/20, tolerance 5.
        let job = plan_rebalance(WalletGroup::Strategy, &allocation(31, 49, 20), &target(), &config(5.0), Utc::now());
        assert!(job.is_none());
    }

    #[test]
    fn drift_past_tolerance_emits_trades_largest_first() {
        // total 100: BNB 45 (target 30, drift +15), USDT 35 (target 50, drift -15), WBNB 20 (on target).
        let job = plan_rebalance(WalletGroup::Strategy, &allocation(45, 35, 20), &target(), &config(5.0), Utc::now()).unwrap();
        match job.kind {
            FundJobKind::Rebalance { trades, .. } => {
                assert_eq!(trades.len(), 2);
                assert_eq!(trades[0].asset, "BNB");
                assert_eq!(trades[0].side, Side::Short);
                assert_eq!(trades[1].asset, "USDT");
                assert_eq!(trades[1].side, Side::Long);
            }
            _ => panic!("expected Rebalance"),
        }
    }

    #[test]
    fn trade_value_is_capped_at_max_single_trade() {
        let mut cfg = config(1.0);
        cfg.max_single_trade_usd = Micros::from_units(5);
        // total 100, drift 20pp -> raw 20 but capped at 5.
        let job = plan_rebalance(WalletGroup::Strategy, &allocation(50, 30, 20), &target(), &cfg, Utc::now()).unwrap();
        match job.kind {
            FundJobKind::Rebalance { trades, .. } => {
                assert_eq!(trades[0].amount, Micros::from_units(5));
            }
            _ => panic!("expected Rebalance"),
        }
    }

    #[test]
    fn trades_below_min_rebalance_value_are_dropped() {
        let mut cfg = config(0.5);
        cfg.min_rebalance_value_usd = Micros::from_units(1000);
        let job = plan_rebalance(WalletGroup::Strategy, &allocation(31, 49, 20), &target(), &cfg, Utc::now());
        assert!(job.is_none());
    }
}
