//! Typed repository functions for `fund_jobs` and `balance_snapshots`.
//! `FundJobKind` is a tagged enum with a variable shape per variant, so
//! unlike the other entities here it's stored as `jsonb` rather than
//! unpacked into columns — the same choice `rpcp-planner`'s `RiskAction`
//! makes for its opaque `parameters` field.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rpcp_schemas::entities::{BalanceSnapshot, FundJob, FundJobStatus, WalletGroup};
use sqlx::{PgExecutor, Row};
use uuid::Uuid;

fn job_status_str(s: FundJobStatus) -> &'static str {
    match s {
        FundJobStatus::Pending => "pending",
        FundJobStatus::Executing => "executing",
        FundJobStatus::Completed => "completed",
        FundJobStatus::Failed => "failed",
    }
}

fn parse_job_status(s: &str) -> Result<FundJobStatus> {
    Ok(match s {
        "pending" => FundJobStatus::Pending,
        "executing" => FundJobStatus::Executing,
        "completed" => FundJobStatus::Completed,
        "failed" => FundJobStatus::Failed,
        other => anyhow::bail!("unknown fund job status in store: {other}"),
    })
}

fn wallet_group_str(g: WalletGroup) -> &'static str {
    match g {
        WalletGroup::Hot => "hot",
        WalletGroup::Warm => "warm",
        WalletGroup::Cold => "cold",
        WalletGroup::Treasury => "treasury",
        WalletGroup::Strategy => "strategy",
    }
}

fn parse_wallet_group(s: &str) -> Result<WalletGroup> {
    Ok(match s {
        "hot" => WalletGroup::Hot,
        "warm" => WalletGroup::Warm,
        "cold" => WalletGroup::Cold,
        "treasury" => WalletGroup::Treasury,
        "strategy" => WalletGroup::Strategy,
        other => anyhow::bail!("unknown wallet group in store: {other}"),
    })
}

pub async fn insert_job<'e, E: PgExecutor<'e>>(exec: E, job: &FundJob) -> Result<()> {
    let kind_json = serde_json::to_value(&job.kind).context("serialize fund job kind")?;
    sqlx::query(
        r#"
        insert into fund_jobs (id, kind, status, created_at, executed_at, tx_ref, dry_run, error)
        values ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(job.id)
    .bind(kind_json)
    .bind(job_status_str(job.status))
    .bind(job.created_at)
    .bind(job.executed_at)
    .bind(&job.tx_ref)
    .bind(job.dry_run)
    .bind(&job.error)
    .execute(exec)
    .await
    .context("insert_job failed")?;
    Ok(())
}

pub async fn mark_job_status<'e, E: PgExecutor<'e>>(
    exec: E,
    job_id: Uuid,
    status: FundJobStatus,
    tx_ref: Option<&str>,
    error: Option<&str>,
    executed_at: Option<DateTime<Utc>>,
) -> Result<()> {
    sqlx::query(
        "update fund_jobs set status = $2, tx_ref = coalesce($3, tx_ref), error = $4, \
         executed_at = coalesce($5, executed_at), updated_at = now() where id = $1",
    )
    .bind(job_id)
    .bind(job_status_str(status))
    .bind(tx_ref)
    .bind(error)
    .bind(executed_at)
    .execute(exec)
    .await
    .context("mark_job_status failed")?;
    Ok(())
}

/// `true` if `wallet_address` already has a non-terminal `GasTopUp` job —
/// the gate `plan_gas_top_up`'s `has_pending_job` argument reads.
pub async fn has_pending_gas_top_up<'e, E: PgExecutor<'e>>(exec: E, wallet_address: &str) -> Result<bool> {
    let row = sqlx::query(
        r#"
        select exists(
          select 1 from fund_jobs
          where status in ('pending', 'executing')
            and kind->>'type' = 'gas_top_up'
            and kind->>'target_wallet' = $1
        ) as pending
        "#,
    )
    .bind(wallet_address)
    .fetch_one(exec)
    .await
    .context("has_pending_gas_top_up failed")?;
    row.try_get("pending").context("read pending flag")
}

pub async fn insert_balance_snapshot<'e, E: PgExecutor<'e>>(exec: E, snap: &BalanceSnapshot) -> Result<()> {
    sqlx::query(
        r#"
        insert into balance_snapshots (
          wallet_address, wallet_group, asset, balance, quote_value,
          below_gas_threshold, above_sweep_threshold, observed_at
        ) values ($1, $2, $3, $4, $5, $6, $7, $8)
        on conflict (wallet_address, asset, observed_at) do nothing
        "#,
    )
    .bind(&snap.wallet_address)
    .bind(wallet_group_str(snap.wallet_group))
    .bind(&snap.asset)
    .bind(snap.balance.raw())
    .bind(snap.quote_value.raw())
    .bind(snap.below_gas_threshold)
    .bind(snap.above_sweep_threshold)
    .bind(snap.observed_at)
    .execute(exec)
    .await
    .context("insert_balance_snapshot failed")?;
    Ok(())
}

/// The latest snapshot row per `(wallet_address, asset)` — what the
/// gas-drip/sweeper loops scan each tick.
pub async fn latest_snapshots<'e, E: PgExecutor<'e>>(exec: E) -> Result<Vec<BalanceSnapshot>> {
    let rows = sqlx::query(
        r#"
        select distinct on (wallet_address, asset)
          wallet_address, wallet_group, asset, balance, quote_value,
          below_gas_threshold, above_sweep_threshold, observed_at
        from balance_snapshots
        order by wallet_address, asset, observed_at desc
        "#,
    )
    .fetch_all(exec)
    .await
    .context("latest_snapshots failed")?;

    rows.iter()
        .map(|row| {
            Ok(BalanceSnapshot {
                wallet_address: row.try_get("wallet_address")?,
                wallet_group: parse_wallet_group(row.try_get::<String, _>("wallet_group")?.as_str())?,
                asset: row.try_get("asset")?,
                balance: rpcp_schemas::Micros::new(row.try_get("balance")?),
                quote_value: rpcp_schemas::Micros::new(row.try_get("quote_value")?),
                below_gas_threshold: row.try_get("below_gas_threshold")?,
                above_sweep_threshold: row.try_get("above_sweep_threshold")?,
                observed_at: row.try_get("observed_at")?,
            })
        })
        .collect()
}
