//! §4.9 / §7: every C4-C8 write path consults the emergency flag and
//! short-circuits with `EmergencyHalted`, except emergency-stop's own plan
//! execution, which is always allowed so the system can actually get flat.

use crate::emergency::EmergencyFlag;
use rpcp_schemas::entities::ActionKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmergencyHalted;

impl std::fmt::Display for EmergencyHalted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EMERGENCY_HALTED: write path refused, emergency flag is set")
    }
}

impl std::error::Error for EmergencyHalted {}

/// Call at the top of every C4-C8 write-side entry point. `action_kind` is
/// `None` for paths with no associated action (e.g. a funds-controller
/// loop tick); `Some(ActionKind::EmergencyStop)` is the single kind that
/// bypasses the halt.
pub fn check_write_gate(flag: &EmergencyFlag, action_kind: Option<ActionKind>) -> Result<(), EmergencyHalted> {
    if !flag.is_halted() {
        return Ok(());
    }
    if action_kind == Some(ActionKind::EmergencyStop) {
        return Ok(());
    }
    Err(EmergencyHalted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn clear_flag_allows_everything() {
        let flag = EmergencyFlag::default();
        assert!(check_write_gate(&flag, None).is_ok());
        assert!(check_write_gate(&flag, Some(ActionKind::PositionReduce)).is_ok());
    }

    #[test]
    fn halted_flag_blocks_other_writes() {
        let mut flag = EmergencyFlag::default();
        flag.activate(Uuid::new_v4(), Utc::now());
        assert_eq!(check_write_gate(&flag, Some(ActionKind::PositionReduce)), Err(EmergencyHalted));
        assert_eq!(check_write_gate(&flag, None), Err(EmergencyHalted));
    }

    #[test]
    fn halted_flag_still_allows_emergency_stop_plan_execution() {
        let mut flag = EmergencyFlag::default();
        flag.activate(Uuid::new_v4(), Utc::now());
        assert!(check_write_gate(&flag, Some(ActionKind::EmergencyStop)).is_ok());
    }
}
