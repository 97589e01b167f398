//! C9 Coordinator: start/stop ordering, the in-process event bus, and the
//! emergency-flag lifecycle every C4-C8 write path consults.

pub mod bus;
pub mod emergency;
pub mod gate;
pub mod lifecycle;

pub use bus::{CoordinatorEvent, EventBus};
pub use emergency::{EmergencyFlag, EmergencyHalt};
pub use gate::{check_write_gate, EmergencyHalted};
pub use lifecycle::{stop_order, Component, START_ORDER};
