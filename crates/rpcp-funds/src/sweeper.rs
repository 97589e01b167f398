//! §4.8 "Sweeper loop": moves `(balance - leaving_amount)` of an
//! over-threshold asset from a non-treasury wallet to the sweep target.
//! Native coin is never swept off a wallet — it pays that wallet's own gas.

use chrono::{DateTime, Utc};
use rpcp_config::tree::FundsConfig;
use rpcp_schemas::entities::{BalanceSnapshot, FundJob, FundJobKind, FundJobStatus, WalletGroup};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepRefusal {
    BelowThreshold,
    SweepDisabled,
    NativeAssetSweepForbidden,
    NotAllowlisted,
    Blocklisted,
    TreasuryWalletExempt,
    NothingLeftAfterLeavingAmount,
}

/// Per-wallet sweep policy the caller resolves from wallet configuration
/// (§4.8 "respects per-wallet whitelist/blacklist of assets").
#[derive(Debug, Clone)]
pub struct SweepPolicy {
    pub sweep_enabled: bool,
    pub asset_allowlist: Option<Vec<String>>,
    pub asset_blocklist: Vec<String>,
}

impl SweepPolicy {
    fn allows(&self, asset: &str) -> Result<(), SweepRefusal> {
        if !self.sweep_enabled {
            return Err(SweepRefusal::SweepDisabled);
        }
        if self.asset_blocklist.iter().any(|a| a == asset) {
            return Err(SweepRefusal::Blocklisted);
        }
        if let Some(allow) = &self.asset_allowlist {
            if !allow.iter().any(|a| a == asset) {
                return Err(SweepRefusal::NotAllowlisted);
            }
        }
        Ok(())
    }
}

pub fn plan_sweep(
    snapshot: &BalanceSnapshot,
    native_asset: &str,
    policy: &SweepPolicy,
    config: &FundsConfig,
    now: DateTime<Utc>,
) -> Result<FundJob, SweepRefusal> {
    if snapshot.wallet_group == WalletGroup::Treasury {
        return Err(SweepRefusal::TreasuryWalletExempt);
    }
    if !snapshot.above_sweep_threshold {
        return Err(SweepRefusal::BelowThreshold);
    }
    if snapshot.asset == native_asset {
        return Err(SweepRefusal::NativeAssetSweepForbidden);
    }
    policy.allows(&snapshot.asset)?;

    let amount = snapshot.balance - config.leaving_amount;
    if amount.is_zero() || amount.is_negative() {
        return Err(SweepRefusal::NothingLeftAfterLeavingAmount);
    }

    let dry_run = config.sweeper.dry_run;
    Ok(FundJob {
        id: Uuid::new_v4(),
        kind: FundJobKind::Sweep {
            source_wallet: snapshot.wallet_address.clone(),
            target_wallet: config.treasury_address.clone(),
            asset: snapshot.asset.clone(),
            amount,
        },
        status: if dry_run { FundJobStatus::Completed } else { FundJobStatus::Pending },
        created_at: now,
        executed_at: if dry_run { Some(now) } else { None },
        tx_ref: None,
        dry_run,
        error: None,
    })
}
