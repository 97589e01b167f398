//! The in-process typed event bus the Coordinator subscribes to, and every
//! other component publishes onto: a single bounded broadcast channel,
//! SSE/CLI adapters subscribe independently, lag is tolerated (slow
//! subscribers drop, they don't block publishers).

use rpcp_schemas::entities::{ActionKind, FundJob, RiskAction, RiskAlert};
use rpcp_schemas::entities::{ExecutionOrder, ExecutionPlan};
use tokio::sync::broadcast;

/// One of the §6 "Events published" topics, carrying its payload directly
/// rather than the opaque `serde_json::Value` the wire envelope uses —
/// in-process subscribers get the typed value, adapters serialize at the
/// edge.
#[derive(Debug, Clone)]
pub enum CoordinatorEvent {
    AlertCreated(RiskAlert),
    AlertResolved(RiskAlert),
    ActionCreated(RiskAction),
    ActionCompleted(RiskAction),
    ActionFailed(RiskAction),
    PlanCreated(ExecutionPlan),
    PlanOrderSubmitted(ExecutionOrder),
    PlanCompleted(ExecutionPlan),
    PlanFailed(ExecutionPlan),
    PlanExpired(ExecutionPlan),
    PlanCancelled(ExecutionPlan),
    FundsJobCreated(FundJob),
    FundsJobCompleted(FundJob),
    FundsJobFailed(FundJob),
    EmergencyActivated { triggering_alert_id: uuid::Uuid },
    EmergencyResumed,
}

impl CoordinatorEvent {
    /// `true` for the one event the Coordinator itself reacts to by
    /// flipping the emergency flag (§4.9).
    pub fn is_emergency_trigger(&self) -> bool {
        matches!(
            self,
            CoordinatorEvent::ActionCreated(a) if a.kind == ActionKind::EmergencyStop
        )
    }
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoordinatorEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _rx) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: CoordinatorEvent) {
        // A broadcast send errors only when there are no receivers; that's
        // a normal state (no subscriber yet), not a failure to report.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
