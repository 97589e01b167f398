//! Typed repository functions for `risk_alerts`. Row mapping is manual
//! (`Row::try_get`), so this crate needs no compile-time-checked query
//! macros or a live database at build time.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rpcp_schemas::entities::{AlertKind, ActionKind, EntityType, RiskAlert, Severity};
use rpcp_schemas::Micros;
use sqlx::{PgExecutor, Row};
use uuid::Uuid;

fn alert_kind_str(k: AlertKind) -> &'static str {
    match k {
        AlertKind::PositionSize => "position_size",
        AlertKind::Concentration => "concentration",
        AlertKind::UnrealizedLoss => "unrealized_loss",
        AlertKind::StrategyDailyLoss => "strategy_daily_loss",
        AlertKind::PortfolioDrawdown => "portfolio_drawdown",
        AlertKind::Correlation => "correlation",
        AlertKind::Liquidity => "liquidity",
        AlertKind::System => "system",
    }
}

fn parse_alert_kind(s: &str) -> Result<AlertKind> {
    Ok(match s {
        "position_size" => AlertKind::PositionSize,
        "concentration" => AlertKind::Concentration,
        "unrealized_loss" => AlertKind::UnrealizedLoss,
        "strategy_daily_loss" => AlertKind::StrategyDailyLoss,
        "portfolio_drawdown" => AlertKind::PortfolioDrawdown,
        "correlation" => AlertKind::Correlation,
        "liquidity" => AlertKind::Liquidity,
        "system" => AlertKind::System,
        other => anyhow::bail!("unknown alert kind in store: {other}"),
    })
}

fn severity_str(s: Severity) -> &'static str {
    match s {
        Severity::Low => "low",
        Severity::Medium => "medium",
        Severity::High => "high",
        Severity::Critical => "critical",
    }
}

fn parse_severity(s: &str) -> Result<Severity> {
    Ok(match s {
        "low" => Severity::Low,
        "medium" => Severity::Medium,
        "high" => Severity::High,
        "critical" => Severity::Critical,
        other => anyhow::bail!("unknown severity in store: {other}"),
    })
}

fn entity_type_str(e: EntityType) -> &'static str {
    match e {
        EntityType::Position => "position",
        EntityType::Portfolio => "portfolio",
        EntityType::Strategy => "strategy",
        EntityType::System => "system",
    }
}

fn parse_entity_type(s: &str) -> Result<EntityType> {
    Ok(match s {
        "position" => EntityType::Position,
        "portfolio" => EntityType::Portfolio,
        "strategy" => EntityType::Strategy,
        "system" => EntityType::System,
        other => anyhow::bail!("unknown entity type in store: {other}"),
    })
}

fn action_kind_str(a: ActionKind) -> &'static str {
    match a {
        ActionKind::PositionReduce => "position_reduce",
        ActionKind::PositionClose => "position_close",
        ActionKind::StrategyPause => "strategy_pause",
        ActionKind::EmergencyStop => "emergency_stop",
        ActionKind::NotifyOnly => "notify_only",
    }
}

fn parse_action_kind(s: &str) -> Result<ActionKind> {
    Ok(match s {
        "position_reduce" => ActionKind::PositionReduce,
        "position_close" => ActionKind::PositionClose,
        "strategy_pause" => ActionKind::StrategyPause,
        "emergency_stop" => ActionKind::EmergencyStop,
        "notify_only" => ActionKind::NotifyOnly,
        other => anyhow::bail!("unknown action kind in store: {other}"),
    })
}

fn row_to_alert(row: &sqlx::postgres::PgRow) -> Result<RiskAlert> {
    let recommended_action: Option<String> = row.try_get("recommended_action")?;
    Ok(RiskAlert {
        id: row.try_get("id")?,
        kind: parse_alert_kind(row.try_get::<String, _>("kind")?.as_str())?,
        severity: parse_severity(row.try_get::<String, _>("severity")?.as_str())?,
        entity_type: parse_entity_type(row.try_get::<String, _>("entity_type")?.as_str())?,
        entity_id: row.try_get("entity_id")?,
        current_value: Micros::new(row.try_get("current_value")?),
        limit_value: Micros::new(row.try_get("limit_value")?),
        message: row.try_get("message")?,
        recommended_action: recommended_action.map(|s| parse_action_kind(&s)).transpose()?,
        created_at: row.try_get("created_at")?,
        resolved_at: row.try_get("resolved_at")?,
        resolved_by: row.try_get("resolved_by")?,
    })
}

pub async fn insert_alert<'e, E: PgExecutor<'e>>(exec: E, alert: &RiskAlert) -> Result<()> {
    sqlx::query(
        r#"
        insert into risk_alerts (
          id, kind, severity, entity_type, entity_id, current_value, limit_value,
          message, recommended_action, created_at, resolved_at, resolved_by
        ) values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(alert.id)
    .bind(alert_kind_str(alert.kind))
    .bind(severity_str(alert.severity))
    .bind(entity_type_str(alert.entity_type))
    .bind(&alert.entity_id)
    .bind(alert.current_value.raw())
    .bind(alert.limit_value.raw())
    .bind(&alert.message)
    .bind(alert.recommended_action.map(action_kind_str))
    .bind(alert.created_at)
    .bind(alert.resolved_at)
    .bind(&alert.resolved_by)
    .execute(exec)
    .await
    .context("insert_alert failed")?;
    Ok(())
}

/// The single open alert for `(kind, entity_id)`, if any — the row
/// `record_breach`/`record_in_bounds` refresh rather than duplicate.
pub async fn find_open<'e, E: PgExecutor<'e>>(
    exec: E,
    kind: AlertKind,
    entity_id: &str,
) -> Result<Option<RiskAlert>> {
    let row = sqlx::query(
        "select * from risk_alerts where kind = $1 and entity_id = $2 and resolved_at is null",
    )
    .bind(alert_kind_str(kind))
    .bind(entity_id)
    .fetch_optional(exec)
    .await
    .context("find_open alert failed")?;
    row.as_ref().map(row_to_alert).transpose()
}

/// Resolution is monotonic: rows already resolved are left untouched
/// (the `where resolved_at is null` guard), so a racing double-resolve is
/// a no-op rather than a reopen.
pub async fn resolve<'e, E: PgExecutor<'e>>(
    exec: E,
    alert_id: Uuid,
    resolved_at: DateTime<Utc>,
    resolved_by: &str,
) -> Result<bool> {
    let result = sqlx::query(
        "update risk_alerts set resolved_at = $2, resolved_by = $3, updated_at = now() \
         where id = $1 and resolved_at is null",
    )
    .bind(alert_id)
    .bind(resolved_at)
    .bind(resolved_by)
    .execute(exec)
    .await
    .context("resolve alert failed")?;
    Ok(result.rows_affected() > 0)
}
