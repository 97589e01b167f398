//! `rpcp status` — print the daemon's current status snapshot as
//! `key=value` lines, one field per line.

use anyhow::{Context, Result};

use super::daemon_base_url;

pub async fn run() -> Result<()> {
    let resp = reqwest::Client::new()
        .get(format!("{}/v1/status", daemon_base_url()))
        .send()
        .await
        .context("GET /v1/status failed")?
        .error_for_status()
        .context("daemon returned an error status")?
        .json::<serde_json::Value>()
        .await
        .context("response was not valid JSON")?;

    println!("daemon_uptime_secs={}", resp["daemon_uptime_secs"]);
    println!("emergency_halted={}", resp["emergency_halted"]);
    println!("triggering_alert_id={}", resp["triggering_alert_id"]);
    println!("notes={}", resp["notes"]);
    Ok(())
}
