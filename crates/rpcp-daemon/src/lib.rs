//! rpcp-daemon library target.
//!
//! Exposes the router and state for integration tests. The binary
//! `main.rs` depends on this library target. Contains no control-plane
//! logic of its own: it wires the Coordinator's emergency flag and event
//! bus to HTTP/SSE, nothing more.

pub mod api_types;
pub mod routes;
pub mod state;
