// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `MongoBackend` — the real-driver [`StoreBackend`] (spec §4.1).
//!
//! Grounded on the `mongodb`/`bson` idiom the corpus uses elsewhere:
//! `Collection<Document>`, the `doc!` macro, and manual
//! `cursor.advance()`/`deserialize_current()` draining rather than pulling in
//! a streams combinator crate just for this.

use async_trait::async_trait;
use bson::Document;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{FindOptions, IndexOptions};
use mongodb::{Client, Database, IndexModel};
use schedstore_storage::{BackendError, FindQuery, IndexSpec, StoreBackend, UpdateOutcome};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct MongoBackend {
    db: Database,
}

impl MongoBackend {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, BackendError> {
        let client = Client::with_uri_str(uri).await.map_err(classify)?;
        Ok(Self { db: client.database(database) })
    }

    pub fn from_database(db: Database) -> Self {
        Self { db }
    }

    fn collection(&self, name: &str) -> mongodb::Collection<Document> {
        self.db.collection(name)
    }
}

/// MongoDB duplicate-key error (E11000) — the signal `StoreBackend`'s
/// upsert contract relies on to report lock/repository CAS contention
/// instead of a hard failure (see `StoreBackend::replace_one`'s doc
/// comment).
fn is_duplicate_key_error(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(we)) => we.code == 11000,
        ErrorKind::BulkWrite(failure) => failure.write_errors.iter().any(|e| e.code == 11000),
        _ => false,
    }
}

fn classify(err: mongodb::error::Error) -> BackendError {
    match err.kind.as_ref() {
        ErrorKind::Io(_) | ErrorKind::ServerSelection { .. } | ErrorKind::ConnectionPoolCleared { .. } => {
            BackendError::Transient(err.to_string())
        }
        _ => BackendError::Permanent(err.to_string()),
    }
}

fn check_cancel(cancel: &CancellationToken) -> Result<(), BackendError> {
    if cancel.is_cancelled() {
        Err(BackendError::Cancelled)
    } else {
        Ok(())
    }
}

#[async_trait]
impl StoreBackend for MongoBackend {
    async fn find_one(&self, collection: &str, filter: Document, cancel: &CancellationToken) -> Result<Option<Document>, BackendError> {
        check_cancel(cancel)?;
        self.collection(collection).find_one(filter).await.map_err(classify)
    }

    async fn find_many(&self, collection: &str, query: FindQuery, cancel: &CancellationToken) -> Result<Vec<Document>, BackendError> {
        check_cancel(cancel)?;
        let mut options = FindOptions::default();
        options.sort = query.sort;
        options.limit = query.limit;
        options.projection = query.projection;

        let mut cursor = self.collection(collection).find(query.filter).with_options(options).await.map_err(classify)?;
        let mut results = Vec::new();
        loop {
            check_cancel(cancel)?;
            if !cursor.advance().await.map_err(classify)? {
                break;
            }
            results.push(cursor.deserialize_current().map_err(classify)?);
        }
        Ok(results)
    }

    async fn insert_one(&self, collection: &str, document: Document, cancel: &CancellationToken) -> Result<(), BackendError> {
        check_cancel(cancel)?;
        if let Err(err) = self.collection(collection).insert_one(document).await {
            if is_duplicate_key_error(&err) {
                return Err(BackendError::Permanent(format!("duplicate key inserting into {collection}")));
            }
            return Err(classify(err));
        }
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
        check_cancel(cancel)?;
        let result = self.collection(collection).replace_one(filter, replacement).upsert(upsert).await;
        match result {
            Ok(r) => Ok(UpdateOutcome { matched: r.matched_count, modified: r.modified_count }),
            // An upsert whose filter matched nothing but whose plain-equality
            // fields collide with an existing unique key: per the trait
            // contract this is contention, not an error (e.g. the
            // distributed mutex's acquire racing another instance).
            Err(err) if upsert && is_duplicate_key_error(&err) => {
                debug!(collection, "replace_one upsert lost a duplicate-key race");
                Ok(UpdateOutcome::default())
            }
            Err(err) => Err(classify(err)),
        }
    }

    async fn update_one(&self, collection: &str, filter: Document, update: Document, cancel: &CancellationToken) -> Result<UpdateOutcome, BackendError> {
        check_cancel(cancel)?;
        let result = self.collection(collection).update_one(filter, update).await.map_err(classify)?;
        Ok(UpdateOutcome { matched: result.matched_count, modified: result.modified_count })
    }

    async fn update_many(&self, collection: &str, filter: Document, update: Document, cancel: &CancellationToken) -> Result<UpdateOutcome, BackendError> {
        check_cancel(cancel)?;
        let result = self.collection(collection).update_many(filter, update).await.map_err(classify)?;
        Ok(UpdateOutcome { matched: result.matched_count, modified: result.modified_count })
    }

    async fn delete_one(&self, collection: &str, filter: Document, cancel: &CancellationToken) -> Result<u64, BackendError> {
        check_cancel(cancel)?;
        let result = self.collection(collection).delete_one(filter).await.map_err(classify)?;
        Ok(result.deleted_count)
    }

    async fn delete_many(&self, collection: &str, filter: Document, cancel: &CancellationToken) -> Result<u64, BackendError> {
        check_cancel(cancel)?;
        let result = self.collection(collection).delete_many(filter).await.map_err(classify)?;
        Ok(result.deleted_count)
    }

    async fn count(&self, collection: &str, filter: Document, cancel: &CancellationToken) -> Result<u64, BackendError> {
        check_cancel(cancel)?;
        self.collection(collection).count_documents(filter).await.map_err(classify)
    }

    async fn ensure_indexes(&self, collection: &str, indexes: &[IndexSpec]) -> Result<(), BackendError> {
        if indexes.is_empty() {
            return Ok(());
        }
        let models = indexes
            .iter()
            .map(|spec| {
                let mut options = IndexOptions::builder().name(spec.name.clone()).unique(spec.unique);
                if let Some(secs) = spec.expire_after_seconds {
                    options = options.expire_after(Some(Duration::from_secs(secs as u64)));
                }
                IndexModel::builder().keys(spec.keys.clone()).options(options.build()).build()
            })
            .collect::<Vec<_>>();
        self.collection(collection).create_indexes(models).await.map_err(classify)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "mongo_tests.rs"]
mod tests;
