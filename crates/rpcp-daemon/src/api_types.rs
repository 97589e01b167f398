//! Request and response types for all rpcp-daemon HTTP endpoints. No
//! business logic lives here.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
}

/// Response for POST /v1/emergency/activate and /v1/emergency/resume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyResponse {
    pub halted: bool,
    pub triggering_alert_id: Option<Uuid>,
}

/// Body for POST /v1/emergency/activate. `alert_id` is optional: an
/// operator-initiated trip with no backing `RiskAlert` uses the nil UUID.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmergencyActivateRequest {
    pub alert_id: Option<Uuid>,
}
