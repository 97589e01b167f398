//! Typed pub/sub envelope for the event bus (§6 "Events published").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope<T> {
    pub event_id: Uuid,
    pub ts_utc: DateTime<Utc>,
    pub correlation_id: Uuid,
    pub causation_id: Option<Uuid>,
    pub topic: String,
    pub event_type: String,
    pub payload: T,
}

impl<T> EventEnvelope<T> {
    pub fn new(topic: impl Into<String>, event_type: impl Into<String>, payload: T) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            ts_utc: Utc::now(),
            correlation_id: Uuid::new_v4(),
            causation_id: None,
            topic: topic.into(),
            event_type: event_type.into(),
            payload,
        }
    }

    pub fn caused_by(mut self, causation_id: Uuid) -> Self {
        self.causation_id = Some(causation_id);
        self
    }
}

/// Topic name constants, grouped by §6's enumerated list. These are the
/// literal `topic` values carried on every [`EventEnvelope`].
pub mod topics {
    pub const RISK_ALERT_CREATED: &str = "risk.alert.created";
    pub const RISK_ALERT_RESOLVED: &str = "risk.alert.resolved";
    pub const RISK_ACTION_CREATED: &str = "risk.action.created";
    pub const RISK_ACTION_COMPLETED: &str = "risk.action.completed";
    pub const RISK_ACTION_FAILED: &str = "risk.action.failed";
    pub const PLAN_CREATED: &str = "plan.created";
    pub const PLAN_ORDER_SUBMITTED: &str = "plan.order_submitted";
    pub const PLAN_COMPLETED: &str = "plan.completed";
    pub const PLAN_FAILED: &str = "plan.failed";
    pub const PLAN_EXPIRED: &str = "plan.expired";
    pub const PLAN_CANCELLED: &str = "plan.cancelled";
    pub const FUNDS_JOB_CREATED: &str = "funds.job.created";
    pub const FUNDS_JOB_COMPLETED: &str = "funds.job.completed";
    pub const FUNDS_JOB_FAILED: &str = "funds.job.failed";
    pub const EMERGENCY_ACTIVATED: &str = "emergency.activated";
    pub const EMERGENCY_RESUMED: &str = "emergency.resumed";
}
