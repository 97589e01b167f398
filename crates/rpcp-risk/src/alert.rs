//! §4.5 "Alert dedup and cooldown" and resolution-by-hysteresis.
//!
//! Mirrors the sticky-state-machine shape of a deterministic evaluator over
//! an explicit state plus input: the book holds every alert ever created
//! (never deleted, per the §3 invariant); each tick either refreshes an
//! open alert, opens a new one, or advances an open alert's in-bounds
//! streak toward auto-resolution.

use chrono::{DateTime, Utc};
use rpcp_schemas::entities::{ActionKind, AlertKind, EntityType, RiskAlert, Severity};
use rpcp_schemas::Micros;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub enum AlertEvent {
    Created(RiskAlert),
    Refreshed(Uuid),
    Resolved(Uuid),
}

pub struct AlertBook {
    alerts: Vec<RiskAlert>,
}

impl AlertBook {
    pub fn new(existing: Vec<RiskAlert>) -> Self {
        Self { alerts: existing }
    }

    pub fn into_alerts(self) -> Vec<RiskAlert> {
        self.alerts
    }

    pub fn open_alerts(&self) -> impl Iterator<Item = &RiskAlert> {
        self.alerts.iter().filter(|a| !a.is_resolved())
    }

    fn find_open_mut(&mut self, kind: AlertKind, entity_id: &str) -> Option<&mut RiskAlert> {
        self.alerts
            .iter_mut()
            .find(|a| a.kind == kind && a.entity_id == entity_id && !a.is_resolved())
    }

    /// A threshold is breached this tick. Refreshes the key's open alert if
    /// one exists, otherwise opens a new one.
    #[allow(clippy::too_many_arguments)]
    pub fn record_breach(
        &mut self,
        now: DateTime<Utc>,
        kind: AlertKind,
        severity: Severity,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        current_value: Micros,
        limit_value: Micros,
        message: impl Into<String>,
        recommended_action: Option<ActionKind>,
    ) -> AlertEvent {
        let entity_id = entity_id.into();
        if let Some(existing) = self.find_open_mut(kind, &entity_id) {
            existing.current_value = current_value;
            existing.severity = severity;
            existing.refresh_count = existing.refresh_count.saturating_add(1);
            existing.inside_limit_ticks = 0;
            return AlertEvent::Refreshed(existing.id);
        }

        let alert = RiskAlert {
            id: Uuid::new_v4(),
            kind,
            severity,
            entity_type,
            entity_id,
            current_value,
            limit_value,
            message: message.into(),
            recommended_action,
            created_at: now,
            resolved_at: None,
            resolved_by: None,
            refresh_count: 0,
            inside_limit_ticks: 0,
        };
        self.alerts.push(alert.clone());
        AlertEvent::Created(alert)
    }

    /// The metric for `(kind, entity_id)` is back inside its limit by
    /// `hysteresis_margin_pct` this tick. Advances the in-bounds streak and
    /// auto-resolves once it reaches `hysteresis_ticks`.
    pub fn record_in_bounds(
        &mut self,
        now: DateTime<Utc>,
        kind: AlertKind,
        entity_id: &str,
        hysteresis_ticks: u32,
    ) -> Option<AlertEvent> {
        let existing = self.find_open_mut(kind, entity_id)?;
        existing.inside_limit_ticks = existing.inside_limit_ticks.saturating_add(1);
        if existing.inside_limit_ticks >= hysteresis_ticks {
            existing.resolve(now, "auto:hysteresis");
            Some(AlertEvent::Resolved(existing.id))
        } else {
            None
        }
    }
}

/// `true` when `value` has returned inside `limit` by at least
/// `hysteresis_margin_pct` of the limit's magnitude.
pub fn within_hysteresis_margin(value: f64, limit: f64, hysteresis_margin_pct: f64) -> bool {
    if limit <= 0.0 {
        return true;
    }
    value <= limit * (1.0 - hysteresis_margin_pct)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    #[test]
    fn first_breach_creates_alert() {
        let mut book = AlertBook::new(vec![]);
        let ev = book.record_breach(
            now(),
            AlertKind::Concentration,
            Severity::High,
            EntityType::Portfolio,
            "global",
            Micros::from_units(60),
            Micros::from_units(50),
            "concentration breach",
            Some(ActionKind::PositionReduce),
        );
        assert!(matches!(ev, AlertEvent::Created(_)));
        assert_eq!(book.open_alerts().count(), 1);
    }

    #[test]
    fn repeated_breach_refreshes_not_duplicates() {
        let mut book = AlertBook::new(vec![]);
        book.record_breach(
            now(),
            AlertKind::Concentration,
            Severity::High,
            EntityType::Portfolio,
            "global",
            Micros::from_units(60),
            Micros::from_units(50),
            "m",
            None,
        );
        let ev = book.record_breach(
            now(),
            AlertKind::Concentration,
            Severity::High,
            EntityType::Portfolio,
            "global",
            Micros::from_units(65),
            Micros::from_units(50),
            "m",
            None,
        );
        assert!(matches!(ev, AlertEvent::Refreshed(_)));
        assert_eq!(book.open_alerts().count(), 1);
        assert_eq!(book.open_alerts().next().unwrap().refresh_count, 1);
    }

    #[test]
    fn resolves_after_hysteresis_ticks() {
        let mut book = AlertBook::new(vec![]);
        book.record_breach(
            now(),
            AlertKind::Concentration,
            Severity::High,
            EntityType::Portfolio,
            "global",
            Micros::from_units(60),
            Micros::from_units(50),
            "m",
            None,
        );
        assert!(book.record_in_bounds(now(), AlertKind::Concentration, "global", 3).is_none());
        assert!(book.record_in_bounds(now(), AlertKind::Concentration, "global", 3).is_none());
        let ev = book.record_in_bounds(now(), AlertKind::Concentration, "global", 3);
        assert!(matches!(ev, Some(AlertEvent::Resolved(_))));
        assert_eq!(book.open_alerts().count(), 0);
    }

    #[test]
    fn resolution_is_monotonic_cannot_reopen() {
        let mut book = AlertBook::new(vec![]);
        book.record_breach(
            now(),
            AlertKind::Liquidity,
            Severity::Medium,
            EntityType::Position,
            "p1",
            Micros::from_units(1),
            Micros::from_units(1),
            "m",
            None,
        );
        for _ in 0..3 {
            book.record_in_bounds(now(), AlertKind::Liquidity, "p1", 3);
        }
        assert_eq!(book.open_alerts().count(), 0);
        // A fresh breach after resolution opens a brand-new alert instead of
        // reopening the resolved one.
        let ev = book.record_breach(
            now(),
            AlertKind::Liquidity,
            Severity::Medium,
            EntityType::Position,
            "p1",
            Micros::from_units(2),
            Micros::from_units(1),
            "m",
            None,
        );
        assert!(matches!(ev, AlertEvent::Created(_)));
        let resolved_count = book.alerts.iter().filter(|a| a.is_resolved()).count();
        assert_eq!(resolved_count, 1);
    }

    #[test]
    fn within_hysteresis_margin_requires_clearance_below_limit() {
        assert!(!within_hysteresis_margin(48.0, 50.0, 0.05)); // only 4% below, needs 5%
        assert!(within_hysteresis_margin(47.0, 50.0, 0.05));
    }
}
