//! C6 — Action Planner.
//!
//! Consumes alert events and enqueues a `RiskAction` record per alert,
//! following §4.6's policy mapping. Pure: the caller supplies the existing
//! in-flight actions (read from the store) and persists whatever this
//! returns.

use chrono::{DateTime, Utc};
use rpcp_schemas::entities::{ActionKind, ActionStatus, AlertKind, RiskAction, RiskAlert, Severity};
use uuid::Uuid;

/// §4.6's policy table. Overridable by callers who want a different mapping
/// (the table here is the default policy, not a hard rule).
pub fn default_mapping(kind: AlertKind, severity: Severity) -> Option<ActionKind> {
    use ActionKind::*;
    use AlertKind::*;
    use Severity::*;

    match (kind, severity) {
        (PositionSize, High) | (PositionSize, Critical) => Some(PositionReduce),
        (Concentration, High) | (Concentration, Critical) => Some(PositionReduce),
        (UnrealizedLoss, High) | (UnrealizedLoss, Critical) => Some(PositionClose),
        (StrategyDailyLoss, High) | (StrategyDailyLoss, Critical) => Some(StrategyPause),
        (PortfolioDrawdown, Critical) => Some(EmergencyStop),
        (Correlation, Medium) | (Correlation, High) | (Correlation, Critical) => Some(NotifyOnly),
        (Liquidity, Medium) | (Liquidity, High) | (Liquidity, Critical) => Some(NotifyOnly),
        _ => None,
    }
}

/// The reduction fraction §4.6 names for `position_reduce`.
pub const POSITION_REDUCE_FRACTION: f64 = 0.30;

fn action_parameters(kind: ActionKind, alert: &RiskAlert) -> serde_json::Value {
    match kind {
        ActionKind::PositionReduce => serde_json::json!({
            "position_id": alert.entity_id,
            "reduction_fraction": POSITION_REDUCE_FRACTION,
        }),
        ActionKind::PositionClose => serde_json::json!({ "position_id": alert.entity_id }),
        ActionKind::StrategyPause => serde_json::json!({ "strategy_id": alert.entity_id }),
        ActionKind::EmergencyStop => serde_json::json!({}),
        ActionKind::NotifyOnly => serde_json::json!({ "entity_id": alert.entity_id }),
    }
}

/// Plans at most one non-cancelled action per (triggering alert, kind) per
/// `cooldown_secs` window, per §4.6 "each action references its triggering
/// alert; the pair forms the idempotency key for C7". Returns `None` when
/// the alert's severity doesn't cross the policy's threshold, or an action
/// for this alert is already in flight within the cooldown window.
pub fn plan_action(
    alert: &RiskAlert,
    existing_actions: &[RiskAction],
    now: DateTime<Utc>,
    cooldown_secs: i64,
) -> Option<RiskAction> {
    let kind = default_mapping(alert.kind, alert.severity)?;

    let already_in_flight = existing_actions.iter().any(|a| {
        a.triggering_alert_id == alert.id
            && a.kind == kind
            && a.status != ActionStatus::Cancelled
            && (now - a.created_at).num_seconds() < cooldown_secs
    });
    if already_in_flight {
        return None;
    }

    Some(RiskAction {
        id: Uuid::new_v4(),
        kind,
        triggering_alert_id: alert.id,
        parameters: action_parameters(kind, alert),
        status: ActionStatus::Pending,
        created_at: now,
        executed_at: None,
        result: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpcp_schemas::entities::EntityType;
    use rpcp_schemas::Micros;

    fn alert(kind: AlertKind, severity: Severity) -> RiskAlert {
        RiskAlert {
            id: Uuid::new_v4(),
            kind,
            severity,
            entity_type: EntityType::Position,
            entity_id: "pos-1".into(),
            current_value: Micros::from_units(10),
            limit_value: Micros::from_units(5),
            message: "m".into(),
            recommended_action: None,
            created_at: Utc::now(),
            resolved_at: None,
            resolved_by: None,
            refresh_count: 0,
            inside_limit_ticks: 0,
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    #[test]
    fn position_size_high_maps_to_position_reduce() {
        let a = alert(AlertKind::PositionSize, Severity::High);
        let action = plan_action(&a, &[], now(), 300).unwrap();
        assert_eq!(action.kind, ActionKind::PositionReduce);
        assert_eq!(action.parameters["reduction_fraction"], 0.30);
    }

    #[test]
    fn unrealized_loss_high_maps_to_position_close() {
        let a = alert(AlertKind::UnrealizedLoss, Severity::High);
        let action = plan_action(&a, &[], now(), 300).unwrap();
        assert_eq!(action.kind, ActionKind::PositionClose);
    }

    #[test]
    fn strategy_daily_loss_high_maps_to_strategy_pause() {
        let a = alert(AlertKind::StrategyDailyLoss, Severity::High);
        let action = plan_action(&a, &[], now(), 300).unwrap();
        assert_eq!(action.kind, ActionKind::StrategyPause);
    }

    #[test]
    fn portfolio_drawdown_critical_maps_to_emergency_stop() {
        let a = alert(AlertKind::PortfolioDrawdown, Severity::Critical);
        let action = plan_action(&a, &[], now(), 300).unwrap();
        assert_eq!(action.kind, ActionKind::EmergencyStop);
    }

    #[test]
    fn portfolio_drawdown_below_critical_has_no_action() {
        let a = alert(AlertKind::PortfolioDrawdown, Severity::High);
        assert!(plan_action(&a, &[], now(), 300).is_none());
    }

    #[test]
    fn correlation_medium_maps_to_notify_only() {
        let a = alert(AlertKind::Correlation, Severity::Medium);
        let action = plan_action(&a, &[], now(), 300).unwrap();
        assert_eq!(action.kind, ActionKind::NotifyOnly);
    }

    #[test]
    fn within_cooldown_does_not_duplicate_action() {
        let a = alert(AlertKind::PositionSize, Severity::High);
        let first = plan_action(&a, &[], now(), 300).unwrap();
        let second = plan_action(&a, &[first], now(), 300);
        assert!(second.is_none());
    }

    #[test]
    fn after_cooldown_elapses_new_action_is_planned() {
        let a = alert(AlertKind::PositionSize, Severity::High);
        let first = plan_action(&a, &[], now(), 300).unwrap();
        let later = now() + chrono::Duration::seconds(301);
        let second = plan_action(&a, &[first], later, 300);
        assert!(second.is_some());
    }

    #[test]
    fn cancelled_action_does_not_block_replanning() {
        let a = alert(AlertKind::PositionSize, Severity::High);
        let mut first = plan_action(&a, &[], now(), 300).unwrap();
        first.status = ActionStatus::Cancelled;
        let second = plan_action(&a, &[first], now(), 300);
        assert!(second.is_some());
    }
}
