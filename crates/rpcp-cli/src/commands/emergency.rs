//! `rpcp emergency activate|resume` — the operator's manual kill switch,
//! talking to the running daemon's `/v1/emergency/*` routes.
//!
//! Resuming from a halt is the highest-stakes action this CLI exposes, so
//! it requires an explicit typed confirmation phrase rather than a bare
//! `--yes` flag.

use anyhow::{Context, Result};
use serde_json::json;

use super::daemon_base_url;

const RESUME_CONFIRMATION_PHRASE: &str = "RESUME TRADING";

pub async fn activate(alert_id: Option<String>) -> Result<()> {
    let body = json!({ "alert_id": alert_id });
    let resp = reqwest::Client::new()
        .post(format!("{}/v1/emergency/activate", daemon_base_url()))
        .json(&body)
        .send()
        .await
        .context("POST /v1/emergency/activate failed")?
        .error_for_status()
        .context("daemon refused the request")?
        .json::<serde_json::Value>()
        .await
        .context("response was not valid JSON")?;

    println!("halted={}", resp["halted"]);
    println!("triggering_alert_id={}", resp["triggering_alert_id"]);
    Ok(())
}

pub async fn resume(confirm: Option<String>) -> Result<()> {
    enforce_resume_confirmation(confirm.as_deref())?;

    let resp = reqwest::Client::new()
        .post(format!("{}/v1/emergency/resume", daemon_base_url()))
        .send()
        .await
        .context("POST /v1/emergency/resume failed")?
        .error_for_status()
        .context("daemon refused the request")?
        .json::<serde_json::Value>()
        .await
        .context("response was not valid JSON")?;

    println!("halted={}", resp["halted"]);
    Ok(())
}

fn enforce_resume_confirmation(confirm: Option<&str>) -> Result<()> {
    let confirm = confirm
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "manual confirmation required to resume from emergency halt. expected: \"{}\" (use --confirm)",
                RESUME_CONFIRMATION_PHRASE
            )
        })?;

    if confirm != RESUME_CONFIRMATION_PHRASE {
        return Err(anyhow::anyhow!(
            "manual confirmation mismatch. expected: \"{}\" got: \"{}\"",
            RESUME_CONFIRMATION_PHRASE,
            confirm
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_confirmation_is_rejected() {
        assert!(enforce_resume_confirmation(None).is_err());
    }

    #[test]
    fn wrong_confirmation_is_rejected() {
        assert!(enforce_resume_confirmation(Some("yes")).is_err());
    }

    #[test]
    fn exact_phrase_is_accepted() {
        assert!(enforce_resume_confirmation(Some("RESUME TRADING")).is_ok());
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert!(enforce_resume_confirmation(Some("  RESUME TRADING  ")).is_ok());
    }
}
