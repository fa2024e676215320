// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `MemoryBackend` — the in-process fake [`StoreBackend`], the direct
//! analogue of the teacher's `FakeAgentAdapter`. Used by every crate above
//! this one in its own tests, and by the workspace-level end-to-end specs.
//!
//! Implements just enough query semantics (`$eq`/`$ne`/`$lt`/`$lte`/`$gt`/
//! `$gte`/`$in`/`$regex`/`$or`) to exercise the acquisition query and the
//! misfire sweep filter (spec §4.3, §4.6.5) without a live database.

use crate::backend::{BackendError, FindQuery, IndexSpec, StoreBackend, UpdateOutcome};
use async_trait::async_trait;
use bson::{Bson, Document};
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
pub struct MemoryBackend {
    collections: Mutex<HashMap<String, Vec<Document>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_cancel(cancel: &CancellationToken) -> Result<(), BackendError> {
        if cancel.is_cancelled() {
            Err(BackendError::Cancelled)
        } else {
            Ok(())
        }
    }
}

fn compare_bson(a: &Bson, b: &Bson) -> Option<Ordering> {
    match (a, b) {
        (Bson::DateTime(x), Bson::DateTime(y)) => Some(x.cmp(y)),
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        _ => {
            let xf = a.as_f64().or_else(|| a.as_i64().map(|v| v as f64)).or_else(|| a.as_i32().map(|v| v as f64));
            let yf = b.as_f64().or_else(|| b.as_i64().map(|v| v as f64)).or_else(|| b.as_i32().map(|v| v as f64));
            match (xf, yf) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => None,
            }
        }
    }
}

fn matches_value(actual: Option<&Bson>, expected: &Bson) -> bool {
    match expected {
        Bson::Document(ops) if ops.keys().all(|k| k.starts_with('$')) => {
            ops.iter().all(|(op, operand)| match op.as_str() {
                "$eq" => actual == Some(operand),
                "$ne" => actual != Some(operand),
                "$lt" => actual.and_then(|a| compare_bson(a, operand)).is_some_and(|o| o == Ordering::Less),
                "$lte" => actual
                    .and_then(|a| compare_bson(a, operand))
                    .is_some_and(|o| o != Ordering::Greater),
                "$gt" => actual.and_then(|a| compare_bson(a, operand)).is_some_and(|o| o == Ordering::Greater),
                "$gte" => actual.and_then(|a| compare_bson(a, operand)).is_some_and(|o| o != Ordering::Less),
                "$in" => operand.as_array().is_some_and(|arr| actual.is_some_and(|a| arr.contains(a))),
                "$regex" => {
                    let pattern = operand.as_str().unwrap_or_default();
                    let re = regex::Regex::new(pattern).ok();
                    actual
                        .and_then(|a| a.as_str())
                        .zip(re)
                        .is_some_and(|(s, re)| re.is_match(s))
                }
                _ => false,
            })
        }
        _ => actual == Some(expected),
    }
}

fn matches_filter(document: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, expected)| {
        if key == "$or" {
            return expected
                .as_array()
                .is_some_and(|clauses| clauses.iter().any(|c| c.as_document().is_some_and(|d| matches_filter(document, d))));
        }
        matches_value(document.get(key), expected)
    })
}

/// The subset of `filter` that's a plain equality test (no `$`-prefixed
/// operator document, no `$or`) — the fields a real unique index would key
/// an upsert-insert collision check on.
fn equality_only(filter: &Document) -> Document {
    let mut out = Document::new();
    for (key, value) in filter {
        if key == "$or" {
            continue;
        }
        let is_operator_doc = matches!(value, Bson::Document(d) if d.keys().all(|k| k.starts_with('$')));
        if !is_operator_doc {
            out.insert(key.clone(), value.clone());
        }
    }
    out
}

fn apply_update(document: &mut Document, update: &Document) {
    if let Ok(set) = update.get_document("$set") {
        for (k, v) in set {
            document.insert(k.clone(), v.clone());
        }
    } else {
        // Treat a bare document as a full replacement of non-id fields.
        for (k, v) in update {
            if k != "_id" {
                document.insert(k.clone(), v.clone());
            }
        }
    }
}

#[async_trait]
impl StoreBackend for MemoryBackend {
    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        cancel: &CancellationToken,
    ) -> Result<Option<Document>, BackendError> {
        Self::check_cancel(cancel)?;
        let collections = self.collections.lock();
        Ok(collections.get(collection).and_then(|docs| docs.iter().find(|d| matches_filter(d, &filter)).cloned()))
    }

    async fn find_many(
        &self,
        collection: &str,
        query: FindQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<Document>, BackendError> {
        Self::check_cancel(cancel)?;
        let collections = self.collections.lock();
        let mut matched: Vec<Document> = collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| matches_filter(d, &query.filter)).cloned().collect())
            .unwrap_or_default();

        if let Some(sort) = &query.sort {
            matched.sort_by(|a, b| {
                for (field, direction) in sort {
                    let dir = direction.as_i32().unwrap_or(1);
                    let ordering = match (a.get(field), b.get(field)) {
                        (Some(x), Some(y)) => compare_bson(x, y).unwrap_or(Ordering::Equal),
                        (Some(_), None) => Ordering::Greater,
                        (None, Some(_)) => Ordering::Less,
                        (None, None) => Ordering::Equal,
                    };
                    let ordering = if dir < 0 { ordering.reverse() } else { ordering };
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                Ordering::Equal
            });
        }

        if let Some(limit) = query.limit {
            matched.truncate(limit.max(0) as usize);
        }

        if let Some(projection) = &query.projection {
            matched = matched
                .into_iter()
                .map(|d| {
                    let mut projected = Document::new();
                    for field in projection.keys() {
                        if let Some(v) = d.get(field) {
                            projected.insert(field, v.clone());
                        }
                    }
                    projected
                })
                .collect();
        }

        Ok(matched)
    }

    async fn insert_one(
        &self,
        collection: &str,
        document: Document,
        cancel: &CancellationToken,
    ) -> Result<(), BackendError> {
        Self::check_cancel(cancel)?;
        let mut collections = self.collections.lock();
        collections.entry(collection.to_string()).or_default().push(document);
        Ok(())
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
        upsert: bool,
        cancel: &CancellationToken,
    ) -> Result<UpdateOutcome, BackendError> {
        Self::check_cancel(cancel)?;
        let mut collections = self.collections.lock();
        let docs = collections.entry(collection.to_string()).or_default();
        if let Some(existing) = docs.iter_mut().find(|d| matches_filter(d, &filter)) {
            *existing = replacement;
            return Ok(UpdateOutcome { matched: 1, modified: 1 });
        }
        if upsert {
            // Real MongoDB would fail this insert with a duplicate-key error
            // if the filter's equality fields collide with a unique index,
            // even though the full filter (with its range/`$`-operator
            // clauses) matched nothing — the distributed-mutex acquire path
            // depends on exactly that to detect contention. Emulate it by
            // refusing the insert when any existing document shares the
            // filter's plain-equality fields.
            let equality_fields = equality_only(&filter);
            if !equality_fields.is_empty() && docs.iter().any(|d| matches_filter(d, &equality_fields)) {
                return Ok(UpdateOutcome::default());
            }
            docs.push(replacement);
            return Ok(UpdateOutcome { matched: 0, modified: 0 });
        }
        Ok(UpdateOutcome::default())
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        cancel: &CancellationToken,
    ) -> Result<UpdateOutcome, BackendError> {
        Self::check_cancel(cancel)?;
        let mut collections = self.collections.lock();
        let docs = collections.entry(collection.to_string()).or_default();
        if let Some(existing) = docs.iter_mut().find(|d| matches_filter(d, &filter)) {
            apply_update(existing, &update);
            return Ok(UpdateOutcome { matched: 1, modified: 1 });
        }
        Ok(UpdateOutcome::default())
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        cancel: &CancellationToken,
    ) -> Result<UpdateOutcome, BackendError> {
        Self::check_cancel(cancel)?;
        let mut collections = self.collections.lock();
        let docs = collections.entry(collection.to_string()).or_default();
        let mut matched = 0u64;
        for doc in docs.iter_mut().filter(|d| matches_filter(d, &filter)) {
            apply_update(doc, &update);
            matched += 1;
        }
        Ok(UpdateOutcome { matched, modified: matched })
    }

    async fn delete_one(
        &self,
        collection: &str,
        filter: Document,
        cancel: &CancellationToken,
    ) -> Result<u64, BackendError> {
        Self::check_cancel(cancel)?;
        let mut collections = self.collections.lock();
        let docs = collections.entry(collection.to_string()).or_default();
        if let Some(pos) = docs.iter().position(|d| matches_filter(d, &filter)) {
            docs.remove(pos);
            Ok(1)
        } else {
            Ok(0)
        }
    }

    async fn delete_many(
        &self,
        collection: &str,
        filter: Document,
        cancel: &CancellationToken,
    ) -> Result<u64, BackendError> {
        Self::check_cancel(cancel)?;
        let mut collections = self.collections.lock();
        let docs = collections.entry(collection.to_string()).or_default();
        let before = docs.len();
        docs.retain(|d| !matches_filter(d, &filter));
        Ok((before - docs.len()) as u64)
    }

    async fn count(&self, collection: &str, filter: Document, cancel: &CancellationToken) -> Result<u64, BackendError> {
        Self::check_cancel(cancel)?;
        let collections = self.collections.lock();
        Ok(collections.get(collection).map(|docs| docs.iter().filter(|d| matches_filter(d, &filter)).count()).unwrap_or(0) as u64)
    }

    async fn ensure_indexes(&self, _collection: &str, _indexes: &[IndexSpec]) -> Result<(), BackendError> {
        // No query planner to feed; this fake only needs to accept the call.
        Ok(())
    }
}
