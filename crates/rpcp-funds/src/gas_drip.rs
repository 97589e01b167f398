//! §4.8 "Gas-Drip loop": tops up wallets whose native balance fell below
//! `min_gas`, bringing them to `max_gas`. One job per wallet; the caller is
//! responsible for not re-planning a wallet that already has a pending
//! `GasTopUp` job (`has_pending_job`).

use chrono::{DateTime, Utc};
use rpcp_config::tree::FundsConfig;
use rpcp_schemas::entities::{BalanceSnapshot, FundJob, FundJobKind, FundJobStatus};
use uuid::Uuid;

/// `None` when the wallet is above threshold, already topped up, or the
/// computed top-up amount is non-positive (balance already at/above max).
pub fn plan_gas_top_up(
    snapshot: &BalanceSnapshot,
    config: &FundsConfig,
    has_pending_job: bool,
    now: DateTime<Utc>,
) -> Option<FundJob> {
    if !snapshot.below_gas_threshold || has_pending_job {
        return None;
    }
    let amount = config.max_gas - snapshot.balance;
    if amount.is_zero() || amount.is_negative() {
        return None;
    }

    let dry_run = config.gas_drip.dry_run;
    Some(FundJob {
        id: Uuid::new_v4(),
        kind: FundJobKind::GasTopUp { target_wallet: snapshot.wallet_address.clone(), amount },
        // §8 scenario 3: a dry-run job terminalizes immediately with no
        // signer call and no tx_ref.
        status: if dry_run { FundJobStatus::Completed } else { FundJobStatus::Pending },
        created_at: now,
        executed_at: if dry_run { Some(now) } else { None },
        tx_ref: None,
        dry_run,
        error: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpcp_config::tree::SubLoopConfig;
    use rpcp_schemas::entities::WalletGroup;
    use rpcp_schemas::Micros;
    use std::collections::BTreeMap;

    fn config(dry_run: bool) -> FundsConfig {
        FundsConfig {
            min_gas: Micros::from_f64(0.05),
            max_gas: Micros::from_f64(0.2),
            sweep_min: Micros::from_units(100),
            leaving_amount: Micros::from_units(5),
            rebalance_target: BTreeMap::new(),
            tolerance_band: 5.0,
            treasury_address: "treasury".into(),
            managed_wallet_groups: vec!["hot".into()],
            supported_assets: vec!["BNB".into()],
            balance_check_interval_ms: 30_000,
            gas_drip: SubLoopConfig { check_interval_ms: 60_000, max_concurrent: 5, dry_run },
            sweeper: SubLoopConfig { check_interval_ms: 60_000, max_concurrent: 5, dry_run: false },
            rebalancer: SubLoopConfig { check_interval_ms: 300_000, max_concurrent: 1, dry_run: false },
            min_rebalance_value_usd: Micros::from_units(50),
            max_single_trade_usd: Micros::from_units(10_000),
        }
    }

    fn low_balance_snapshot() -> BalanceSnapshot {
        BalanceSnapshot {
            wallet_address: "0xW".into(),
            wallet_group: WalletGroup::Hot,
            asset: "BNB".into(),
            balance: Micros::from_f64(0.01),
            quote_value: Micros::from_units(3),
            below_gas_threshold: true,
            above_sweep_threshold: false,
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn plans_top_up_to_max_gas() {
        let job = plan_gas_top_up(&low_balance_snapshot(), &config(false), false, Utc::now()).unwrap();
        match job.kind {
            FundJobKind::GasTopUp { amount, .. } => assert_eq!(amount, Micros::from_f64(0.19)),
            _ => panic!("expected GasTopUp"),
        }
        assert_eq!(job.status, FundJobStatus::Pending);
        assert!(!job.dry_run);
    }

    #[test]
    fn dry_run_completes_immediately_with_no_tx_ref() {
        let job = plan_gas_top_up(&low_balance_snapshot(), &config(true), false, Utc::now()).unwrap();
        assert_eq!(job.status, FundJobStatus::Completed);
        assert!(job.tx_ref.is_none());
        assert!(job.dry_run);
    }

    #[test]
    fn no_job_when_above_threshold() {
        let mut snap = low_balance_snapshot();
        snap.below_gas_threshold = false;
        assert!(plan_gas_top_up(&snap, &config(false), false, Utc::now()).is_none());
    }

    #[test]
    fn no_job_when_one_already_pending() {
        assert!(plan_gas_top_up(&low_balance_snapshot(), &config(false), true, Utc::now()).is_none());
    }
}
