//! Typed repository functions for `execution_plans` / `execution_orders`.
//!
//! `claim_pending_orders` uses `FOR UPDATE SKIP LOCKED` per-order dispatch:
//! concurrent executor instances never claim the same order, and
//! the `(plan_id, order_index)` unique constraint (§8 "a single (plan,
//! order index) is dispatched at most once globally") is the store-level
//! backstop if a claim is ever bypassed.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rpcp_schemas::entities::{
    ActionKind, ExecutionOrder, ExecutionPlan, OrderExecStatus, OrderType, PlanStatus, PlanStrategy,
    Side, TimeInForce,
};
use rpcp_schemas::Micros;
use sqlx::{PgExecutor, Row};
use uuid::Uuid;

fn plan_type_str(k: ActionKind) -> &'static str {
    match k {
        ActionKind::PositionReduce => "position_reduce",
        ActionKind::PositionClose => "position_close",
        ActionKind::StrategyPause => "strategy_pause",
        ActionKind::EmergencyStop => "emergency_stop",
        ActionKind::NotifyOnly => "notify_only",
    }
}

fn order_type_str(t: OrderType) -> &'static str {
    match t {
        OrderType::MarketBuy => "market_buy",
        OrderType::MarketSell => "market_sell",
        OrderType::Cancel => "cancel",
        OrderType::Update => "update",
    }
}

fn parse_order_type(s: &str) -> Result<OrderType> {
    Ok(match s {
        "market_buy" => OrderType::MarketBuy,
        "market_sell" => OrderType::MarketSell,
        "cancel" => OrderType::Cancel,
        "update" => OrderType::Update,
        other => anyhow::bail!("unknown order type in store: {other}"),
    })
}

fn side_str(s: Side) -> &'static str {
    match s {
        Side::Long => "long",
        Side::Short => "short",
    }
}

fn parse_side(s: &str) -> Result<Side> {
    Ok(match s {
        "long" => Side::Long,
        "short" => Side::Short,
        other => anyhow::bail!("unknown side in store: {other}"),
    })
}

fn tif_str(t: TimeInForce) -> &'static str {
    match t {
        TimeInForce::Gtc => "gtc",
        TimeInForce::Ioc => "ioc",
        TimeInForce::Fok => "fok",
    }
}

fn parse_tif(s: &str) -> Result<TimeInForce> {
    Ok(match s {
        "gtc" => TimeInForce::Gtc,
        "ioc" => TimeInForce::Ioc,
        "fok" => TimeInForce::Fok,
        other => anyhow::bail!("unknown time_in_force in store: {other}"),
    })
}

fn order_status_str(s: OrderExecStatus) -> &'static str {
    match s {
        OrderExecStatus::Pending => "pending",
        OrderExecStatus::Submitted => "submitted",
        OrderExecStatus::PartiallyFilled => "partially_filled",
        OrderExecStatus::Filled => "filled",
        OrderExecStatus::Cancelled => "cancelled",
        OrderExecStatus::Failed => "failed",
    }
}

fn parse_order_status(s: &str) -> Result<OrderExecStatus> {
    Ok(match s {
        "pending" => OrderExecStatus::Pending,
        "submitted" => OrderExecStatus::Submitted,
        "partially_filled" => OrderExecStatus::PartiallyFilled,
        "filled" => OrderExecStatus::Filled,
        "cancelled" => OrderExecStatus::Cancelled,
        "failed" => OrderExecStatus::Failed,
        other => anyhow::bail!("unknown order status in store: {other}"),
    })
}

fn plan_status_str(s: PlanStatus) -> &'static str {
    match s {
        PlanStatus::Pending => "pending",
        PlanStatus::Executing => "executing",
        PlanStatus::Completed => "completed",
        PlanStatus::Failed => "failed",
        PlanStatus::Cancelled => "cancelled",
        PlanStatus::Expired => "expired",
    }
}

fn plan_strategy_str(s: PlanStrategy) -> &'static str {
    match s {
        PlanStrategy::Sequential => "sequential",
        PlanStrategy::Parallel => "parallel",
        PlanStrategy::Staggered => "staggered",
    }
}

fn row_to_order(row: &sqlx::postgres::PgRow) -> Result<ExecutionOrder> {
    Ok(ExecutionOrder {
        id: row.try_get("id")?,
        plan_id: row.try_get("plan_id")?,
        order_index: row.try_get::<i32, _>("order_index")? as u32,
        order_type: parse_order_type(row.try_get::<String, _>("order_type")?.as_str())?,
        symbol: row.try_get("symbol")?,
        side: parse_side(row.try_get::<String, _>("side")?.as_str())?,
        amount: row.try_get("amount")?,
        limit_price: row.try_get::<Option<i64>, _>("limit_price")?.map(Micros::new),
        stop_price: row.try_get::<Option<i64>, _>("stop_price")?.map(Micros::new),
        time_in_force: parse_tif(row.try_get::<String, _>("time_in_force")?.as_str())?,
        reduce_only: row.try_get("reduce_only")?,
        strategy_id: row.try_get("strategy_id")?,
        position_id: row.try_get("position_id")?,
        status: parse_order_status(row.try_get::<String, _>("status")?.as_str())?,
        tx_ref: row.try_get("tx_ref")?,
        filled_amount: row.try_get("filled_amount")?,
        avg_price: row.try_get::<Option<i64>, _>("avg_price")?.map(Micros::new),
        fees: Micros::new(row.try_get("fees")?),
        retries: row.try_get::<i32, _>("retries")? as u32,
    })
}

/// Inserts a plan and all of its orders. Callers run this inside `txn` so
/// a partially-inserted order list is never visible.
pub async fn insert_plan<'e, E: PgExecutor<'e> + Copy>(exec: E, plan: &ExecutionPlan) -> Result<()> {
    sqlx::query(
        r#"
        insert into execution_plans (
          id, risk_action_id, plan_type, strategy_id, position_id, status,
          dispatch_strategy, created_at, expires_at, result
        ) values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(plan.id)
    .bind(plan.risk_action_id)
    .bind(plan_type_str(plan.plan_type))
    .bind(&plan.strategy_id)
    .bind(plan.position_id)
    .bind(plan_status_str(plan.status))
    .bind(plan_strategy_str(plan.dispatch_strategy))
    .bind(plan.created_at)
    .bind(plan.expires_at)
    .bind(&plan.result)
    .execute(exec)
    .await
    .context("insert_plan failed")?;

    for order in &plan.orders {
        sqlx::query(
            r#"
            insert into execution_orders (
              id, plan_id, order_index, order_type, symbol, side, amount,
              limit_price, stop_price, time_in_force, reduce_only, strategy_id,
              position_id, status, tx_ref, filled_amount, avg_price, fees, retries
            ) values ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19)
            "#,
        )
        .bind(order.id)
        .bind(order.plan_id)
        .bind(order.order_index as i32)
        .bind(order_type_str(order.order_type))
        .bind(&order.symbol)
        .bind(side_str(order.side))
        .bind(order.amount)
        .bind(order.limit_price.map(|m| m.raw()))
        .bind(order.stop_price.map(|m| m.raw()))
        .bind(tif_str(order.time_in_force))
        .bind(order.reduce_only)
        .bind(&order.strategy_id)
        .bind(order.position_id)
        .bind(order_status_str(order.status))
        .bind(&order.tx_ref)
        .bind(order.filled_amount)
        .bind(order.avg_price.map(|m| m.raw()))
        .bind(order.fees.raw())
        .bind(order.retries as i32)
        .execute(exec)
        .await
        .context("insert_order failed")?;
    }
    Ok(())
}

/// Atomically claims up to `batch_size` unclaimed, pending orders for
/// exclusive dispatch by `dispatcher_id`. Callers must follow up with
/// `release_claim` on failure so another dispatcher (or a restart) can
/// retry the order.
pub async fn claim_pending_orders<'e, E: PgExecutor<'e>>(
    exec: E,
    batch_size: i64,
    dispatcher_id: &str,
) -> Result<Vec<ExecutionOrder>> {
    let rows = sqlx::query(
        r#"
        with to_claim as (
            select id
            from execution_orders
            where status = 'pending' and claimed_at is null
            order by plan_id, order_index
            limit $1
            for update skip locked
        )
        update execution_orders
           set claimed_at = now(), claimed_by = $2
         where id in (select id from to_claim)
        returning *
        "#,
    )
    .bind(batch_size)
    .bind(dispatcher_id)
    .fetch_all(exec)
    .await
    .context("claim_pending_orders failed")?;

    rows.iter().map(row_to_order).collect()
}

pub async fn release_claim<'e, E: PgExecutor<'e>>(exec: E, order_id: Uuid) -> Result<()> {
    sqlx::query("update execution_orders set claimed_at = null, claimed_by = null where id = $1")
        .bind(order_id)
        .execute(exec)
        .await
        .context("release_claim failed")?;
    Ok(())
}

pub async fn mark_order_status<'e, E: PgExecutor<'e>>(
    exec: E,
    order_id: Uuid,
    status: OrderExecStatus,
    tx_ref: Option<&str>,
    filled_amount: i64,
) -> Result<()> {
    sqlx::query(
        "update execution_orders set status = $2, tx_ref = coalesce($3, tx_ref), \
         filled_amount = $4, updated_at = now() where id = $1",
    )
    .bind(order_id)
    .bind(order_status_str(status))
    .bind(tx_ref)
    .bind(filled_amount)
    .execute(exec)
    .await
    .context("mark_order_status failed")?;
    Ok(())
}

pub async fn mark_plan_status<'e, E: PgExecutor<'e>>(
    exec: E,
    plan_id: Uuid,
    status: PlanStatus,
    result: Option<&str>,
) -> Result<()> {
    sqlx::query("update execution_plans set status = $2, result = coalesce($3, result), updated_at = now() where id = $1")
        .bind(plan_id)
        .bind(plan_status_str(status))
        .bind(result)
        .execute(exec)
        .await
        .context("mark_plan_status failed")?;
    Ok(())
}

/// Non-terminal plans, for restart reload (§4.7 "reloads non-terminal
/// plans and continues from their persisted order statuses").
pub async fn find_non_terminal_plans<'e, E: PgExecutor<'e>>(exec: E) -> Result<Vec<Uuid>> {
    let rows = sqlx::query(
        "select id from execution_plans where status not in ('completed','failed','cancelled','expired')",
    )
    .fetch_all(exec)
    .await
    .context("find_non_terminal_plans failed")?;
    rows.iter().map(|r| r.try_get::<Uuid, _>("id").context("read plan id")).collect()
}

/// Marks every still-pending plan past its `expires_at` as expired (§8
/// scenario 6). Returns the ids touched, for the `plan.expired` event.
pub async fn expire_overdue_plans<'e, E: PgExecutor<'e>>(exec: E, now: DateTime<Utc>) -> Result<Vec<Uuid>> {
    let rows = sqlx::query(
        "update execution_plans set status = 'expired', updated_at = now() \
         where status in ('pending','executing') and expires_at < $1 \
         returning id",
    )
    .bind(now)
    .fetch_all(exec)
    .await
    .context("expire_overdue_plans failed")?;
    rows.iter().map(|r| r.try_get::<Uuid, _>("id").context("read plan id")).collect()
}
