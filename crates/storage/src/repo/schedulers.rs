// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler-instance registration repository (spec §4.3, §4.7 lifecycle).

use crate::backend::FindQuery;
use crate::context::StorageContext;
use crate::docs::SchedulerDocument;
use crate::error::RepoError;
use crate::retry::retry_transient;
use bson::doc;
use chrono::{DateTime, Utc};
use schedstore_core::{InstanceId, SchedulerRegistration};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct SchedulerRepository {
    ctx: Arc<StorageContext>,
}

fn pk_filter(instance_name: &str, instance_id: &str) -> bson::Document {
    doc! { "instance_name": instance_name, "instance_id": instance_id }
}

impl SchedulerRepository {
    pub fn new(ctx: Arc<StorageContext>) -> Self {
        Self { ctx }
    }

    pub async fn get(
        &self,
        instance_name: &str,
        instance_id: &InstanceId,
        cancel: &CancellationToken,
    ) -> Result<Option<SchedulerRegistration>, RepoError> {
        let doc = self
            .ctx
            .backend
            .find_one(&self.ctx.names.schedulers(), pk_filter(instance_name, instance_id.as_str()), cancel)
            .await
            .map_err(RepoError::Persistence)?;
        match doc {
            Some(d) => Ok(Some(bson::from_document::<SchedulerDocument>(d)?.into())),
            None => Ok(None),
        }
    }

    /// Register or refresh a scheduler instance row (spec §4.7
    /// `SchedulerStarted` and the periodic check-in).
    pub async fn upsert(&self, registration: &SchedulerRegistration, cancel: &CancellationToken) -> Result<(), RepoError> {
        let document = bson::to_document(&SchedulerDocument::from(registration))?;
        let collection = self.ctx.names.schedulers();
        retry_transient(&self.ctx.retry, cancel, || {
            let backend = self.ctx.backend.clone();
            let collection = collection.clone();
            let filter = pk_filter(registration.instance_name.as_str(), registration.instance_id.as_str());
            let document = document.clone();
            async move { backend.replace_one(&collection, filter, document, true, cancel).await.map(|_| ()) }
        })
        .await
        .map_err(RepoError::Persistence)
    }

    pub async fn remove(&self, instance_name: &str, instance_id: &InstanceId, cancel: &CancellationToken) -> Result<bool, RepoError> {
        let collection = self.ctx.names.schedulers();
        let deleted = retry_transient(&self.ctx.retry, cancel, || {
            let backend = self.ctx.backend.clone();
            let collection = collection.clone();
            let filter = pk_filter(instance_name, instance_id.as_str());
            async move { backend.delete_one(&collection, filter, cancel).await }
        })
        .await
        .map_err(RepoError::Persistence)?;
        Ok(deleted > 0)
    }

    pub async fn list(&self, instance_name: &str, cancel: &CancellationToken) -> Result<Vec<SchedulerRegistration>, RepoError> {
        let query = FindQuery::new(doc! { "instance_name": instance_name });
        let docs = self.ctx.backend.find_many(&self.ctx.names.schedulers(), query, cancel).await.map_err(RepoError::Persistence)?;
        docs.into_iter().map(|d| Ok(bson::from_document::<SchedulerDocument>(d)?.into())).collect()
    }

    /// Every scheduler registration row for `instance_name`, regardless of
    /// `instance_id` (spec §4.7 `ClearAllSchedulingData`).
    pub async fn remove_all(&self, instance_name: &str, cancel: &CancellationToken) -> Result<u64, RepoError> {
        let filter = doc! { "instance_name": instance_name };
        let collection = self.ctx.names.schedulers();
        retry_transient(&self.ctx.retry, cancel, || {
            let backend = self.ctx.backend.clone();
            let collection = collection.clone();
            let filter = filter.clone();
            async move { backend.delete_many(&collection, filter, cancel).await }
        })
        .await
        .map_err(RepoError::Persistence)
    }

    /// Instances whose last check-in is older than `floor` — candidates for
    /// crash recovery (spec §4.7).
    pub async fn list_stale(
        &self,
        instance_name: &str,
        floor: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<Vec<SchedulerRegistration>, RepoError> {
        let filter = doc! {
            "instance_name": instance_name,
            "last_check_in": { "$lt": bson::DateTime::from_chrono(floor) },
        };
        let docs = self.ctx.backend.find_many(&self.ctx.names.schedulers(), FindQuery::new(filter), cancel).await.map_err(RepoError::Persistence)?;
        docs.into_iter().map(|d| Ok(bson::from_document::<SchedulerDocument>(d)?.into())).collect()
    }
}

#[cfg(test)]
#[path = "schedulers_tests.rs"]
mod tests;
