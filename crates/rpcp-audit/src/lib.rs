//! Append-only, hash-chained audit trail.
//!
//! Every alert, action, plan transition, and fund job writes one line here,
//! independent of the mutable rows in the store. This gives operators a
//! tamper-evident replay log distinct from `RiskAlert`/`RiskAction`/
//! `ExecutionPlan` current-state rows, which are overwritten in place.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub struct AuditWriter {
    path: PathBuf,
    last_hash: Option<String>,
    seq: u64,
}

impl AuditWriter {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create_dir_all {:?}", parent))?;
        }
        Ok(Self {
            path,
            last_hash: None,
            seq: 0,
        })
    }

    /// Restore chain state after a restart, from the last line already on disk.
    pub fn resume(&mut self, last_hash: Option<String>, seq: u64) {
        self.last_hash = last_hash;
        self.seq = seq;
    }

    pub fn last_hash(&self) -> Option<String> {
        self.last_hash.clone()
    }

    pub fn append(&mut self, scope: &str, event_type: &str, payload: Value) -> Result<AuditEvent> {
        let ts_utc = Utc::now();
        let event_id = Uuid::new_v4();
        self.seq += 1;

        let mut ev = AuditEvent {
            event_id,
            seq: self.seq,
            ts_utc,
            scope: scope.to_string(),
            event_type: event_type.to_string(),
            payload,
            hash_prev: None,
            hash_self: None,
        };

        let prev = self.last_hash.clone();
        ev.hash_prev = prev;
        let self_hash = compute_event_hash(&ev)?;
        ev.hash_self = Some(self_hash.clone());
        self.last_hash = Some(self_hash);

        let line = canonical_json_line(&ev)?;
        append_line(&self.path, &line)?;
        Ok(ev)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: Uuid,
    pub seq: u64,
    pub ts_utc: DateTime<Utc>,
    pub scope: String,
    pub event_type: String,
    pub payload: Value,
    pub hash_prev: Option<String>,
    pub hash_self: Option<String>,
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open audit log {:?}", path))?;
    f.write_all(line.as_bytes()).context("write audit line failed")?;
    f.write_all(b"\n").context("write newline failed")?;
    Ok(())
}

fn canonical_json_line<T: Serialize>(v: &T) -> Result<String> {
    let raw = serde_json::to_value(v).context("serialize audit event failed")?;
    let sorted = sort_keys(&raw);
    serde_json::to_string(&sorted).context("json stringify failed")
}

fn sort_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            let mut new = serde_json::Map::new();
            for k in keys {
                new.insert(k.clone(), sort_keys(&map[&k]));
            }
            Value::Object(new)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        _ => v.clone(),
    }
}

pub fn compute_event_hash(ev: &AuditEvent) -> Result<String> {
    let mut clone = ev.clone();
    clone.hash_self = None;
    let canonical = canonical_json_line(&clone)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    Valid { lines: usize },
    Broken { line: usize, reason: String },
}

pub fn verify_hash_chain(path: impl AsRef<Path>) -> Result<VerifyResult> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("read audit log {:?}", path.as_ref()))?;
    verify_hash_chain_str(&content)
}

pub fn verify_hash_chain_str(content: &str) -> Result<VerifyResult> {
    let mut prev_hash: Option<String> = None;
    let mut line_count = 0usize;

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let ev: AuditEvent = serde_json::from_str(trimmed)
            .with_context(|| format!("parse audit event at line {}", i + 1))?;
        line_count += 1;

        if ev.hash_prev != prev_hash {
            return Ok(VerifyResult::Broken {
                line: i + 1,
                reason: format!(
                    "hash_prev mismatch: expected {:?}, got {:?}",
                    prev_hash, ev.hash_prev
                ),
            });
        }

        if let Some(ref claimed_hash) = ev.hash_self {
            let recomputed = compute_event_hash(&ev)?;
            if *claimed_hash != recomputed {
                return Ok(VerifyResult::Broken {
                    line: i + 1,
                    reason: format!(
                        "hash_self mismatch: claimed {}, recomputed {}",
                        claimed_hash, recomputed
                    ),
                });
            }
        }

        prev_hash = ev.hash_self.clone();
    }

    Ok(VerifyResult::Valid { lines: line_count })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn chain_of_appends_verifies_valid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let mut w = AuditWriter::new(&path).unwrap();
        w.append("risk", "alert.created", serde_json::json!({"id": "a1"}))
            .unwrap();
        w.append("risk", "action.created", serde_json::json!({"id": "r1"}))
            .unwrap();

        let result = verify_hash_chain(&path).unwrap();
        assert_eq!(result, VerifyResult::Valid { lines: 2 });
    }

    #[test]
    fn tampered_line_breaks_chain() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let mut w = AuditWriter::new(&path).unwrap();
        w.append("risk", "alert.created", serde_json::json!({"id": "a1"}))
            .unwrap();
        w.append("risk", "alert.resolved", serde_json::json!({"id": "a1"}))
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let tampered = content.replace("a1", "a2");
        fs::write(&path, tampered).unwrap();

        let result = verify_hash_chain(&path).unwrap();
        assert!(matches!(result, VerifyResult::Broken { .. }));
    }

    #[test]
    fn resume_preserves_chain_across_restart() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let mut w = AuditWriter::new(&path).unwrap();
        let ev1 = w
            .append("risk", "alert.created", serde_json::json!({"id": "a1"}))
            .unwrap();

        let mut w2 = AuditWriter::new(&path).unwrap();
        w2.resume(ev1.hash_self.clone(), 1);
        w2.append("risk", "alert.resolved", serde_json::json!({"id": "a1"}))
            .unwrap();

        let result = verify_hash_chain(&path).unwrap();
        assert_eq!(result, VerifyResult::Valid { lines: 2 });
    }
}
