// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `DistributedMutex` (spec §4.2) — named, non-reentrant, cluster-wide
//! mutual exclusion over a [`StoreBackend`] document, with TTL-based crash
//! recovery standing in for a heartbeat protocol.

use bson::{doc, Document};
use chrono::{DateTime, Duration, Utc};
use schedstore_core::{InstanceId, InstanceName, LockDocument, LockType};
use schedstore_storage::{BackendError, StoreBackend};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const POLL_INTERVAL: StdDuration = StdDuration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum MutexError {
    #[error("lock operation cancelled")]
    Cancelled,
    #[error("backend error acquiring or releasing lock: {0}")]
    Backend(#[from] BackendError),
    #[error("release rejected: {lock_type:?} is held by a different owner")]
    NotOwner { lock_type: LockType },
}

/// A held lock. Dropping it without calling [`Guard::release`] leaves the
/// document in place until its TTL expires — safe, but it blocks the
/// cluster for up to `ttl` longer than necessary, so callers should always
/// release explicitly once the critical section ends.
pub struct Guard<'a> {
    mutex: &'a DistributedMutex,
    lock_type: LockType,
}

impl Guard<'_> {
    pub async fn release(self, cancel: &CancellationToken) -> Result<(), MutexError> {
        self.mutex.release(self.lock_type, cancel).await
    }
}

pub struct DistributedMutex {
    backend: Arc<dyn StoreBackend>,
    collection: String,
    instance_name: InstanceName,
    owner: InstanceId,
    ttl: Duration,
}

impl DistributedMutex {
    pub fn new(backend: Arc<dyn StoreBackend>, collection: impl Into<String>, instance_name: InstanceName, owner: InstanceId) -> Self {
        Self { backend, collection: collection.into(), instance_name, owner, ttl: Duration::seconds(30) }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn pk_filter(&self, lock_type: LockType) -> Document {
        doc! { "instance_name": self.instance_name.as_str(), "lock_type": lock_type.to_string() }
    }

    /// Block until `lock_type` is claimed or `cancel` fires (spec §4.2
    /// "poll with a fixed sleep until success or cancellation").
    pub async fn acquire(&self, lock_type: LockType, cancel: &CancellationToken) -> Result<Guard<'_>, MutexError> {
        loop {
            if cancel.is_cancelled() {
                return Err(MutexError::Cancelled);
            }
            if self.try_acquire_once(lock_type, cancel).await? {
                return Ok(Guard { mutex: self, lock_type });
            }
            debug!(lock_type = %lock_type, "lock contended, polling");
            tokio::select! {
                _ = tokio::time::sleep(POLL_INTERVAL) => {}
                _ = cancel.cancelled() => return Err(MutexError::Cancelled),
            }
        }
    }

    /// Single claim attempt: one `replace_one` upsert on `(instance_name,
    /// lock_type)` conditioned on "absent or expired" (spec §4.2 acquire).
    /// The filter's `expire_at < now` clause only matches a stale lock, so a
    /// live one sitting there makes the filter match nothing — and
    /// `StoreBackend::replace_one`'s contract (see its doc comment) then
    /// refuses the insert outright because the equality fields collide,
    /// rather than creating a duplicate claim. Either way a re-read
    /// confirms who actually ended up owning the document, since a bare
    /// insert's `UpdateOutcome` can't distinguish "we just created it" from
    /// "the insert was rejected" by `matched`/`modified` alone.
    async fn try_acquire_once(&self, lock_type: LockType, cancel: &CancellationToken) -> Result<bool, MutexError> {
        let now = Utc::now();
        let mut filter = self.pk_filter(lock_type);
        filter.insert("expire_at", doc! { "$lt": bson::DateTime::from_chrono(now) });

        let document = bson::to_document(&LockDocument {
            instance_name: self.instance_name.clone(),
            lock_type,
            owner: self.owner.clone(),
            acquired_at: now,
            expire_at: now + self.ttl,
        })
        .map_err(|e| MutexError::Backend(BackendError::Permanent(e.to_string())))?;

        self.backend.replace_one(&self.collection, filter, document, true, cancel).await?;

        let mut owner_filter = self.pk_filter(lock_type);
        owner_filter.insert("owner", self.owner.as_str());
        Ok(self.backend.find_one(&self.collection, owner_filter, cancel).await?.is_some())
    }

    /// Conditional delete on `(instance_name, lock_type, owner = me)` (spec
    /// §4.2 release). A gone-already document (TTL reaped) is a no-op; a
    /// present document owned by someone else is rejected rather than
    /// silently ignored, so a caller's logic error surfaces immediately.
    async fn release(&self, lock_type: LockType, cancel: &CancellationToken) -> Result<(), MutexError> {
        let mut filter = self.pk_filter(lock_type);
        filter.insert("owner", self.owner.as_str());
        let deleted = self.backend.delete_one(&self.collection, filter, cancel).await?;
        if deleted > 0 {
            return Ok(());
        }
        let still_present = self.backend.find_one(&self.collection, self.pk_filter(lock_type), cancel).await?;
        match still_present {
            Some(_) => Err(MutexError::NotOwner { lock_type }),
            None => Ok(()),
        }
    }

    #[cfg(any(test, feature = "test-support"))]
    pub async fn is_held(&self, lock_type: LockType, cancel: &CancellationToken) -> Result<bool, MutexError> {
        Ok(self.backend.find_one(&self.collection, self.pk_filter(lock_type), cancel).await?.is_some())
    }
}

/// Expiry floor helper for callers wiring the TTL into a `DateTime`-keyed
/// query elsewhere (e.g. the daemon's lock-health diagnostics).
pub fn is_expired(expire_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    expire_at < now
}

#[cfg(test)]
#[path = "mutex_tests.rs"]
mod tests;
