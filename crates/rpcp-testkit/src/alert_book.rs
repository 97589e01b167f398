//! A minimal in-memory stand-in for `rpcp-store::repo::alerts`, for
//! scenario tests that want to exercise the open/resolve contract without a
//! live Postgres.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rpcp_schemas::entities::{AlertKind, RiskAlert};
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryAlertBook {
    alerts: BTreeMap<Uuid, RiskAlert>,
}

impl InMemoryAlertBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, alert: RiskAlert) {
        self.alerts.insert(alert.id, alert);
    }

    pub fn find_open(&self, kind: AlertKind, entity_id: &str) -> Option<&RiskAlert> {
        self.alerts
            .values()
            .find(|a| a.kind == kind && a.entity_id == entity_id && a.resolved_at.is_none())
    }

    /// Mirrors `repo::alerts::resolve`'s monotonic "only touches
    /// still-open rows" guarantee: resolving an already-resolved or
    /// unknown alert is a no-op and returns `false`.
    pub fn resolve(&mut self, alert_id: Uuid, resolved_at: DateTime<Utc>, resolved_by: &str) -> bool {
        match self.alerts.get_mut(&alert_id) {
            Some(alert) if alert.resolved_at.is_none() => {
                alert.resolved_at = Some(resolved_at);
                alert.resolved_by = Some(resolved_by.to_string());
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpcp_schemas::entities::{EntityType, Severity};
    use rpcp_schemas::Micros;

    fn alert() -> RiskAlert {
        RiskAlert {
            id: Uuid::new_v4(),
            kind: AlertKind::PortfolioDrawdown,
            severity: Severity::Critical,
            entity_type: EntityType::Portfolio,
            entity_id: "global".into(),
            current_value: Micros::from_units(25),
            limit_value: Micros::from_units(20),
            message: "m".into(),
            recommended_action: None,
            created_at: Utc::now(),
            resolved_at: None,
            resolved_by: None,
            refresh_count: 0,
            inside_limit_ticks: 0,
        }
    }

    #[test]
    fn find_open_returns_unresolved_matching_alert() {
        let mut book = InMemoryAlertBook::new();
        let a = alert();
        let id = a.id;
        book.insert(a);
        assert_eq!(book.find_open(AlertKind::PortfolioDrawdown, "global").unwrap().id, id);
    }

    #[test]
    fn resolve_is_a_noop_once_already_resolved() {
        let mut book = InMemoryAlertBook::new();
        let a = alert();
        let id = a.id;
        book.insert(a);
        assert!(book.resolve(id, Utc::now(), "op"));
        assert!(!book.resolve(id, Utc::now(), "op"));
        assert!(book.find_open(AlertKind::PortfolioDrawdown, "global").is_none());
    }
}
