// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `StoreBackend` — the port every document-store driver implements (spec
//! §4.1). `schedstore-adapters` supplies the driven sides: `MongoBackend`
//! over the real driver, `MemoryBackend` as the in-process fake.
//!
//! Kept in terms of `bson::Document` rather than a generic `T: DeserializeOwned`
//! so the trait stays object-safe — callers hold an `Arc<dyn StoreBackend>`.

use async_trait::async_trait;
use bson::Document;
use tokio_util::sync::CancellationToken;

/// Backend-level error, already classified transient/permanent (spec §4.1).
/// Concrete backends construct this from whatever their driver raises;
/// `schedstore-storage::retry` only ever inspects `is_transient`.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("transient backend error: {0}")]
    Transient(String),
    #[error("permanent backend error: {0}")]
    Permanent(String),
    #[error("operation cancelled")]
    Cancelled,
}

impl BackendError {
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::Transient(_))
    }
}

/// Sort/limit/projection knobs for `find_many` (spec §4.3's acquisition query
/// and the plainer per-entity bulk queries both go through this).
#[derive(Debug, Clone, Default)]
pub struct FindQuery {
    pub filter: Document,
    pub sort: Option<Document>,
    pub limit: Option<i64>,
    /// Field names to return; empty means the whole document.
    pub projection: Option<Document>,
}

impl FindQuery {
    pub fn new(filter: Document) -> Self {
        Self { filter, sort: None, limit: None, projection: None }
    }

    pub fn sort(mut self, sort: Document) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn projection(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }
}

/// Result of a conditional update — repositories read `matched` to detect a
/// lost CAS race (spec §4.4's "all state writes MUST be conditional").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

impl UpdateOutcome {
    pub fn cas_won(&self) -> bool {
        self.matched > 0
    }
}

/// One index a collection needs ensured before first use (spec §4.1).
#[derive(Debug, Clone)]
pub struct IndexSpec {
    pub name: String,
    pub keys: Document,
    pub unique: bool,
    /// `Some(0)` for the TTL index on `locks.expire_at`.
    pub expire_after_seconds: Option<u32>,
}

impl IndexSpec {
    pub fn new(name: impl Into<String>, keys: Document) -> Self {
        Self { name: name.into(), keys, unique: false, expire_after_seconds: None }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn ttl(mut self, expire_after_seconds: u32) -> Self {
        self.expire_after_seconds = Some(expire_after_seconds);
        self
    }
}

#[async_trait]
pub trait StoreBackend: Send + Sync {
    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        cancel: &CancellationToken,
    ) -> Result<Option<Document>, BackendError>;

    async fn find_many(
        &self,
        collection: &str,
        query: FindQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<Document>, BackendError>;

    async fn insert_one(
        &self,
        collection: &str,
        document: Document,
        cancel: &CancellationToken,
    ) -> Result<(), BackendError>;

    /// Upsert-by-filter if `upsert`, else plain replace; no-op-matched if the
    /// filter matches nothing and `upsert` is false.
    ///
    /// When `upsert` is true and the filter matches nothing, implementations
    /// MUST still refuse the insert (returning a no-op `UpdateOutcome`,
    /// never an error) if the filter's plain-equality fields collide with an
    /// existing document's unique key — a real MongoDB driver call against a
    /// unique index raises `E11000` in exactly this case, and
    /// [`crate::repo`]/the distributed mutex's acquire path relies on that
    /// collision signal to detect contention rather than corrupting state
    /// with a duplicate row.
    async fn replace_one(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
        upsert: bool,
        cancel: &CancellationToken,
    ) -> Result<UpdateOutcome, BackendError>;

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        cancel: &CancellationToken,
    ) -> Result<UpdateOutcome, BackendError>;

    async fn update_many(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        cancel: &CancellationToken,
    ) -> Result<UpdateOutcome, BackendError>;

    async fn delete_one(
        &self,
        collection: &str,
        filter: Document,
        cancel: &CancellationToken,
    ) -> Result<u64, BackendError>;

    async fn delete_many(
        &self,
        collection: &str,
        filter: Document,
        cancel: &CancellationToken,
    ) -> Result<u64, BackendError>;

    async fn count(
        &self,
        collection: &str,
        filter: Document,
        cancel: &CancellationToken,
    ) -> Result<u64, BackendError>;

    async fn ensure_indexes(
        &self,
        collection: &str,
        indexes: &[IndexSpec],
    ) -> Result<(), BackendError>;
}
