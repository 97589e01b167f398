pub mod entities;
pub mod events;
pub mod fixedpoint;

pub use entities::*;
pub use events::{topics, EventEnvelope};
pub use fixedpoint::Micros;
