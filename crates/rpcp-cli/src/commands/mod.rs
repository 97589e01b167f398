//! Command handler modules for rpcp-cli.
//!
//! Shared utilities used by multiple command paths live here. Command
//! handlers talk to a running `rpcp-daemon` over HTTP; none of them touch
//! the control-plane crates directly.

pub mod config_hash;
pub mod emergency;
pub mod status;

/// Base URL of the `rpcp-daemon` HTTP API, from `RPCP_DAEMON_URL` or the
/// daemon's own default bind address.
pub fn daemon_base_url() -> String {
    std::env::var("RPCP_DAEMON_URL").unwrap_or_else(|_| "http://127.0.0.1:8899".to_string())
}
