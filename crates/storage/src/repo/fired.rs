// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fired-trigger repository (spec §4.3, §4.6.3-4, §4.7 crash recovery).

use crate::backend::FindQuery;
use crate::context::StorageContext;
use crate::docs::FiredTriggerDocument;
use crate::error::RepoError;
use crate::retry::retry_transient;
use bson::doc;
use schedstore_core::{FiredTrigger, InstanceId, JobKey, TriggerKey};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct FiredTriggerRepository {
    ctx: Arc<StorageContext>,
}

impl FiredTriggerRepository {
    pub fn new(ctx: Arc<StorageContext>) -> Self {
        Self { ctx }
    }

    /// Record a trigger hand-off (spec §4.6.3 step 4). The primary key is
    /// `fired_instance_id`, unique per `(trigger, instance_id, utc_ticks)` —
    /// re-acquiring the same trigger at a new fire always gets a fresh id,
    /// so this is a plain insert, never a replace.
    pub async fn insert(&self, instance_name: &str, fired: &FiredTrigger, cancel: &CancellationToken) -> Result<(), RepoError> {
        let document = bson::to_document(&FiredTriggerDocument::from_domain(instance_name, fired))?;
        let collection = self.ctx.names.fired_triggers();
        retry_transient(&self.ctx.retry, cancel, || {
            let backend = self.ctx.backend.clone();
            let collection = collection.clone();
            let document = document.clone();
            async move { backend.insert_one(&collection, document, cancel).await }
        })
        .await
        .map_err(RepoError::Persistence)
    }

    /// Delete every fired record for `trigger_key` owned by `instance_id`,
    /// regardless of `utc_ticks` (spec §4.6.4 step 2: `TriggeredJobComplete`
    /// clears the bookkeeping row(s) for the instance that ran it).
    pub async fn remove_for_trigger_instance(
        &self,
        instance_name: &str,
        trigger_key: &TriggerKey,
        instance_id: &InstanceId,
        cancel: &CancellationToken,
    ) -> Result<u64, RepoError> {
        let filter = doc! {
            "instance_name": instance_name,
            "trigger_name": &trigger_key.name,
            "trigger_group": &trigger_key.group,
            "instance_id": instance_id.as_str(),
        };
        let collection = self.ctx.names.fired_triggers();
        retry_transient(&self.ctx.retry, cancel, || {
            let backend = self.ctx.backend.clone();
            let collection = collection.clone();
            let filter = filter.clone();
            async move { backend.delete_many(&collection, filter, cancel).await }
        })
        .await
        .map_err(RepoError::Persistence)
    }

    /// Whether `job_key` is currently running somewhere in the cluster under
    /// a non-reentrant job, i.e. whether new triggers of it must go
    /// `PausedBlocked` instead of `Waiting` (spec §4.4 "Store trigger").
    pub async fn job_is_blocked(&self, job_key: &JobKey, cancel: &CancellationToken) -> Result<bool, RepoError> {
        let filter = doc! {
            "instance_name": job_key.instance_name.as_str(),
            "job_group": &job_key.group,
            "job_name": &job_key.name,
            "concurrent_execution_disallowed": true,
        };
        let count = self.ctx.backend.count(&self.ctx.names.fired_triggers(), filter, cancel).await.map_err(RepoError::Persistence)?;
        Ok(count > 0)
    }

    /// Every fired record an instance left behind, for startup crash
    /// recovery (spec §4.7 `SchedulerStarted`).
    pub async fn list_by_instance(
        &self,
        instance_name: &str,
        instance_id: &InstanceId,
        cancel: &CancellationToken,
    ) -> Result<Vec<FiredTrigger>, RepoError> {
        let filter = doc! { "instance_name": instance_name, "instance_id": instance_id.as_str() };
        let docs = self.ctx.backend.find_many(&self.ctx.names.fired_triggers(), FindQuery::new(filter), cancel).await.map_err(RepoError::Persistence)?;
        docs.into_iter().map(|d| Ok(bson::from_document::<FiredTriggerDocument>(d)?.into())).collect()
    }

    pub async fn remove_by_instance(
        &self,
        instance_name: &str,
        instance_id: &InstanceId,
        cancel: &CancellationToken,
    ) -> Result<u64, RepoError> {
        let filter = doc! { "instance_name": instance_name, "instance_id": instance_id.as_str() };
        let collection = self.ctx.names.fired_triggers();
        retry_transient(&self.ctx.retry, cancel, || {
            let backend = self.ctx.backend.clone();
            let collection = collection.clone();
            let filter = filter.clone();
            async move { backend.delete_many(&collection, filter, cancel).await }
        })
        .await
        .map_err(RepoError::Persistence)
    }

    /// Every fired record for `instance_name`, regardless of owning
    /// instance (spec §4.7 `ClearAllSchedulingData`).
    pub async fn remove_all(&self, instance_name: &str, cancel: &CancellationToken) -> Result<u64, RepoError> {
        let filter = doc! { "instance_name": instance_name };
        let collection = self.ctx.names.fired_triggers();
        retry_transient(&self.ctx.retry, cancel, || {
            let backend = self.ctx.backend.clone();
            let collection = collection.clone();
            let filter = filter.clone();
            async move { backend.delete_many(&collection, filter, cancel).await }
        })
        .await
        .map_err(RepoError::Persistence)
    }
}

#[cfg(test)]
#[path = "fired_tests.rs"]
mod tests;
