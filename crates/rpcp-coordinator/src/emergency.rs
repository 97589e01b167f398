//! The system-wide emergency flag: a narrow, explicit set of transitions,
//! no implicit auto-clear.
//!
//! The default on construction is clear — the flag only exists to record
//! the one thing that can set it (a critical `emergency_stop` alert) and
//! the one thing that can clear it (an explicit operator resume). There is
//! no fail-closed boot semantics here because the flag is not meant to gate
//! startup, only in-flight write paths.

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmergencyHalt {
    pub triggering_alert_id: Uuid,
    pub activated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmergencyFlag {
    Clear,
    Halted(EmergencyHalt),
}

impl Default for EmergencyFlag {
    fn default() -> Self {
        EmergencyFlag::Clear
    }
}

impl EmergencyFlag {
    pub fn is_halted(&self) -> bool {
        matches!(self, EmergencyFlag::Halted(_))
    }

    /// Set by the Coordinator on observing a `critical + emergency_stop`
    /// alert. Re-activating while already halted keeps the original
    /// `activated_at` and alert id — the flag records the first trigger,
    /// not the latest.
    pub fn activate(&mut self, triggering_alert_id: Uuid, now: DateTime<Utc>) {
        if self.is_halted() {
            return;
        }
        *self = EmergencyFlag::Halted(EmergencyHalt { triggering_alert_id, activated_at: now });
    }

    /// The only way out. `operator.emergencyResume()` maps here directly;
    /// nothing else clears the flag.
    pub fn resume(&mut self) {
        *self = EmergencyFlag::Clear;
    }
}
