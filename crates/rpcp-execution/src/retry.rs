//! §4.7 "Per-order retry: up to `maxRetries` on transient errors ..., with
//! exponential backoff; non-retryable errors ... fail the order." Classifies
//! via `rpcp_collab::DexError`'s transient/non-retryable split.

use rpcp_collab::DexError;
use std::time::Duration;

pub fn is_retryable(err: &DexError) -> bool {
    matches!(err, DexError::Transient(_))
}

/// Exponential backoff with a 500ms base, doubling per attempt, capped at
/// 30s. `attempt` is 0-indexed (the first retry after the initial failure).
pub fn backoff_delay(attempt: u32) -> Duration {
    const BASE_MS: u64 = 500;
    const CAP_MS: u64 = 30_000;
    let ms = BASE_MS.saturating_mul(1u64 << attempt.min(16));
    Duration::from_millis(ms.min(CAP_MS))
}

/// `true` once `attempt` retries have been exhausted against `max_retries`.
pub fn retries_exhausted(attempt: u32, max_retries: u32) -> bool {
    attempt >= max_retries
}
