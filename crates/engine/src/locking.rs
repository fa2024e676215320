// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared `TriggerAccess` critical-section helper (spec §4.5 step 1/4: every
//! storage-manager and fire-manager write acquires the lock first and
//! releases it on every exit path, including cancellation).

use crate::error::EngineError;
use schedstore_adapters::DistributedMutex;
use schedstore_core::LockType;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Run `body` while holding `TriggerAccess`. Release is attempted
/// unconditionally on the way out, using a fresh token rather than the
/// caller's — a cancelled `cancel` must still let the lock go, since release
/// is cleanup, not cancellable work in its own right. A release that still
/// fails (e.g. a concurrent `NotOwner`, which should never happen under a
/// correctly-scoped critical section) is logged rather than overriding
/// `body`'s own result; the TTL will reclaim the lock regardless.
pub(crate) async fn with_trigger_access<T, F, Fut>(mutex: &DistributedMutex, cancel: &CancellationToken, body: F) -> Result<T, EngineError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, EngineError>>,
{
    let guard = mutex.acquire(LockType::TriggerAccess, cancel).await?;
    let result = body().await;
    let release_token = CancellationToken::new();
    if let Err(err) = guard.release(&release_token).await {
        warn!(?err, "failed to release TriggerAccess after a critical section");
    }
    result
}
