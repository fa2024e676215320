// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The retry-on-transient wrapper every write passes through (spec §4.1).

use crate::backend::BackendError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay: Duration::from_millis(200) }
    }
}

/// `base · 2^(attempt-1)` plus uniform jitter in `[0, min(1000ms, backoff)]`
/// (spec §4.1, attempt is 1-indexed).
fn backoff_with_jitter(cfg: &RetryConfig, attempt: u32) -> Duration {
    let backoff = cfg.base_delay.saturating_mul(1u32 << (attempt.saturating_sub(1)).min(20));
    let jitter_ceiling = backoff.min(Duration::from_millis(1000));
    let jitter_ms = if jitter_ceiling.is_zero() {
        0
    } else {
        rand::thread_rng().gen_range(0..=jitter_ceiling.as_millis() as u64)
    };
    backoff + Duration::from_millis(jitter_ms)
}

/// Run `op`, retrying transient `BackendError`s up to `cfg.max_attempts`
/// times with growing jittered delays. Permanent errors propagate
/// immediately. Cancellation aborts between retries and during the delay.
pub async fn retry_transient<F, Fut, T>(
    cfg: &RetryConfig,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<T, BackendError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BackendError>>,
{
    let mut attempt = 1;
    loop {
        if cancel.is_cancelled() {
            return Err(BackendError::Cancelled);
        }
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < cfg.max_attempts => {
                let delay = backoff_with_jitter(cfg, attempt);
                warn!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "retrying transient backend error");
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => return Err(BackendError::Cancelled),
                }
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
