//! Shared runtime state for rpcp-daemon.
//!
//! All types here are `Clone`-able (via `Arc` or copy). Handlers receive
//! `State<Arc<AppState>>` from Axum; this module owns nothing async itself
//! beyond the heartbeat and event-forwarder background tasks it spawns.

use std::sync::Arc;
use std::time::Duration;

use rpcp_coordinator::{CoordinatorEvent, EmergencyFlag, EventBus};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// BusMsg — SSE event bus payload
// ---------------------------------------------------------------------------

/// Messages broadcast over the internal event bus and surfaced as SSE
/// events. One variant per `CoordinatorEvent` the daemon forwards, plus the
/// daemon's own heartbeat and status snapshots.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMsg {
    Heartbeat { ts_millis: i64 },
    Status(StatusSnapshot),
    Coordinator { label: String, payload: serde_json::Value },
}

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// StatusSnapshot
// ---------------------------------------------------------------------------

/// Point-in-time snapshot of daemon state, returned by GET /v1/status and
/// carried inside SSE `status` events.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub daemon_uptime_secs: u64,
    pub emergency_halted: bool,
    pub triggering_alert_id: Option<Uuid>,
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Cloneable (Arc) handle shared across all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Broadcast bus for SSE.
    pub bus: broadcast::Sender<BusMsg>,
    /// Static build metadata.
    pub build: BuildInfo,
    /// Mutable status snapshot.
    pub status: Arc<RwLock<StatusSnapshot>>,
    /// The emergency flag every C4-C8 write path consults.
    pub emergency: Arc<RwLock<EmergencyFlag>>,
    /// The in-process Coordinator event bus. Publishers elsewhere in the
    /// process (risk, planner, execution, funds loops) publish here; the
    /// daemon only subscribes and forwards to SSE.
    pub coordinator_bus: EventBus,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        let (bus, _rx) = broadcast::channel::<BusMsg>(1024);

        let initial_status = StatusSnapshot {
            daemon_uptime_secs: uptime_secs(),
            emergency_halted: false,
            triggering_alert_id: None,
            notes: Some("placeholder status; wire coordinator driver next".to_string()),
        };

        Self {
            bus,
            build: BuildInfo {
                service: "rpcp-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            status: Arc::new(RwLock::new(initial_status)),
            emergency: Arc::new(RwLock::new(EmergencyFlag::default())),
            coordinator_bus: EventBus::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Monotonically increasing uptime since first call (process lifetime).
pub fn uptime_secs() -> u64 {
    static START: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();
    START
        .get_or_init(std::time::Instant::now)
        .elapsed()
        .as_secs()
}

/// Spawn a background task that emits a heartbeat SSE every `interval`.
pub fn spawn_heartbeat(bus: broadcast::Sender<BusMsg>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let ts = chrono::Utc::now().timestamp_millis();
            let _ = bus.send(BusMsg::Heartbeat { ts_millis: ts });
        }
    });
}

/// Subscribe to the Coordinator's typed event bus, flip the emergency flag
/// when an emergency-stop action is observed, and forward every event to
/// SSE as an opaque JSON payload. This is the only place rpcp-daemon reacts
/// to domain events rather than merely relaying them.
pub fn spawn_event_forwarder(state: Arc<AppState>) {
    let mut rx = state.coordinator_bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => forward_event(&state, event).await,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

async fn forward_event(state: &Arc<AppState>, event: CoordinatorEvent) {
    if let CoordinatorEvent::ActionCreated(ref action) = event {
        if event.is_emergency_trigger() {
            let mut flag = state.emergency.write().await;
            flag.activate(action.triggering_alert_id, action.created_at);
        }
    }

    let label = event_label(&event);
    let payload = serde_json::to_value(DebugPayload(&event)).unwrap_or(serde_json::Value::Null);
    let _ = state.bus.send(BusMsg::Coordinator { label: label.to_string(), payload });
}

fn event_label(event: &CoordinatorEvent) -> &'static str {
    match event {
        CoordinatorEvent::AlertCreated(_) => "alert_created",
        CoordinatorEvent::AlertResolved(_) => "alert_resolved",
        CoordinatorEvent::ActionCreated(_) => "action_created",
        CoordinatorEvent::ActionCompleted(_) => "action_completed",
        CoordinatorEvent::ActionFailed(_) => "action_failed",
        CoordinatorEvent::PlanCreated(_) => "plan_created",
        CoordinatorEvent::PlanOrderSubmitted(_) => "plan_order_submitted",
        CoordinatorEvent::PlanCompleted(_) => "plan_completed",
        CoordinatorEvent::PlanFailed(_) => "plan_failed",
        CoordinatorEvent::PlanExpired(_) => "plan_expired",
        CoordinatorEvent::PlanCancelled(_) => "plan_cancelled",
        CoordinatorEvent::FundsJobCreated(_) => "funds_job_created",
        CoordinatorEvent::FundsJobCompleted(_) => "funds_job_completed",
        CoordinatorEvent::FundsJobFailed(_) => "funds_job_failed",
        CoordinatorEvent::EmergencyActivated { .. } => "emergency_activated",
        CoordinatorEvent::EmergencyResumed => "emergency_resumed",
    }
}

/// `CoordinatorEvent` carries typed domain payloads without `Serialize`
/// (it's an in-process-only enum); this renders it to JSON for SSE using
/// its `Debug` form rather than growing `serde` impls on every entity enum
/// solely for this one edge.
struct DebugPayload<'a>(&'a CoordinatorEvent);

impl<'a> Serialize for DebugPayload<'a> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&format!("{:?}", self.0))
    }
}
