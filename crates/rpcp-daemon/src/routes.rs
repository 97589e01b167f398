//! Axum router and all HTTP handlers for rpcp-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. All handlers are `pub(crate)` so the scenario tests in
//! `tests/` can compose the router directly.

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures_util::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::info;
use uuid::Uuid;

use crate::{
    api_types::{EmergencyActivateRequest, EmergencyResponse, HealthResponse},
    state::{uptime_secs, AppState, BusMsg},
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/status", get(status_handler))
        .route("/v1/stream", get(stream))
        .route("/v1/emergency/activate", post(emergency_activate))
        .route("/v1/emergency/resume", post(emergency_resume))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service,
            version: st.build.version,
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/status
// ---------------------------------------------------------------------------

pub(crate) async fn status_handler(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let mut snap = st.status.read().await.clone();
    snap.daemon_uptime_secs = uptime_secs();

    {
        let flag = st.emergency.read().await;
        snap.emergency_halted = flag.is_halted();
        snap.triggering_alert_id = match &*flag {
            rpcp_coordinator::EmergencyFlag::Halted(h) => Some(h.triggering_alert_id),
            rpcp_coordinator::EmergencyFlag::Clear => None,
        };
    }

    let _ = st.bus.send(BusMsg::Status(snap.clone()));
    (StatusCode::OK, Json(snap))
}

// ---------------------------------------------------------------------------
// POST /v1/emergency/activate
// ---------------------------------------------------------------------------

/// Operator-initiated emergency trip — the same flag §4.9's automatic
/// critical-drawdown path sets, reachable manually for a human-in-the-loop
/// kill switch. `alert_id` is optional since a manual trip has no backing
/// `RiskAlert`; the nil UUID records that.
pub(crate) async fn emergency_activate(
    State(st): State<Arc<AppState>>,
    Json(body): Json<EmergencyActivateRequest>,
) -> impl IntoResponse {
    let alert_id = body.alert_id.unwrap_or(Uuid::nil());
    let now = chrono::Utc::now();

    {
        let mut flag = st.emergency.write().await;
        flag.activate(alert_id, now);
    }

    let (halted, triggering_alert_id) = sync_status_from_emergency(&st).await;

    info!(%alert_id, "emergency/activate");
    let _ = st.bus.send(BusMsg::Coordinator {
        label: "emergency_activated".to_string(),
        payload: serde_json::json!({ "alert_id": alert_id }),
    });

    (StatusCode::OK, Json(EmergencyResponse { halted, triggering_alert_id }))
}

// ---------------------------------------------------------------------------
// POST /v1/emergency/resume
// ---------------------------------------------------------------------------

/// The sole escape from an emergency halt. Always succeeds — resuming a
/// flag that is already clear is a no-op, not an error.
pub(crate) async fn emergency_resume(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    {
        let mut flag = st.emergency.write().await;
        flag.resume();
    }

    let (halted, triggering_alert_id) = sync_status_from_emergency(&st).await;

    info!("emergency/resume");
    let _ = st.bus.send(BusMsg::Coordinator {
        label: "emergency_resumed".to_string(),
        payload: serde_json::Value::Null,
    });

    (StatusCode::OK, Json(EmergencyResponse { halted, triggering_alert_id }))
}

async fn sync_status_from_emergency(st: &Arc<AppState>) -> (bool, Option<Uuid>) {
    let flag = st.emergency.read().await;
    let halted = flag.is_halted();
    let triggering_alert_id = match &*flag {
        rpcp_coordinator::EmergencyFlag::Halted(h) => Some(h.triggering_alert_id),
        rpcp_coordinator::EmergencyFlag::Clear => None,
    };
    drop(flag);

    let mut s = st.status.write().await;
    s.emergency_halted = halted;
    s.triggering_alert_id = triggering_alert_id;
    s.daemon_uptime_secs = uptime_secs();

    (halted, triggering_alert_id)
}

// ---------------------------------------------------------------------------
// GET /v1/stream  (SSE)
// ---------------------------------------------------------------------------

pub(crate) async fn stream(State(st): State<Arc<AppState>>) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));
    headers.insert("Connection", HeaderValue::from_static("keep-alive"));

    let rx = st.bus.subscribe();
    let events = broadcast_to_sse(rx);

    (headers, Sse::new(events).keep_alive(KeepAlive::new())).into_response()
}

fn broadcast_to_sse(
    rx: broadcast::Receiver<BusMsg>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(rx).filter_map(|msg| async move {
        match msg {
            Ok(m) => {
                let event_name = match &m {
                    BusMsg::Heartbeat { .. } => "heartbeat",
                    BusMsg::Status(_) => "status",
                    BusMsg::Coordinator { .. } => "coordinator",
                };
                let data = serde_json::to_string(&m).ok()?;
                Some(Ok(Event::default().event(event_name).data(data)))
            }
            Err(_) => None, // lagged / closed
        }
    })
}
