// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Paused-trigger-group repository (spec §4.3, §4.5 pause/resume group).
//!
//! A group is paused iff it (or the [`schedstore_core::ALL_GROUPS_PAUSED`]
//! sentinel) has a row here; membership is the only state this collection
//! holds; the trigger-state bulk update it gates lives in
//! [`crate::repo::TriggerRepository`].

use crate::backend::FindQuery;
use crate::context::StorageContext;
use crate::docs::PausedGroupDocument;
use crate::error::RepoError;
use crate::retry::retry_transient;
use bson::doc;
use schedstore_core::ALL_GROUPS_PAUSED;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct PausedGroupRepository {
    ctx: Arc<StorageContext>,
}

impl PausedGroupRepository {
    pub fn new(ctx: Arc<StorageContext>) -> Self {
        Self { ctx }
    }

    pub async fn is_paused(&self, instance_name: &str, group: &str, cancel: &CancellationToken) -> Result<bool, RepoError> {
        let filter = doc! {
            "instance_name": instance_name,
            "$or": [ { "group": group }, { "group": ALL_GROUPS_PAUSED } ],
        };
        let count = self.ctx.backend.count(&self.ctx.names.paused_trigger_groups(), filter, cancel).await.map_err(RepoError::Persistence)?;
        Ok(count > 0)
    }

    pub async fn mark_paused(&self, instance_name: &str, group: &str, cancel: &CancellationToken) -> Result<(), RepoError> {
        let document = bson::to_document(&PausedGroupDocument { instance_name: instance_name.to_string(), group: group.to_string() })?;
        let collection = self.ctx.names.paused_trigger_groups();
        retry_transient(&self.ctx.retry, cancel, || {
            let backend = self.ctx.backend.clone();
            let collection = collection.clone();
            let filter = doc! { "instance_name": instance_name, "group": group };
            let document = document.clone();
            async move { backend.replace_one(&collection, filter, document, true, cancel).await.map(|_| ()) }
        })
        .await
        .map_err(RepoError::Persistence)
    }

    pub async fn mark_resumed(&self, instance_name: &str, group: &str, cancel: &CancellationToken) -> Result<(), RepoError> {
        let collection = self.ctx.names.paused_trigger_groups();
        retry_transient(&self.ctx.retry, cancel, || {
            let backend = self.ctx.backend.clone();
            let collection = collection.clone();
            let filter = doc! { "instance_name": instance_name, "group": group };
            async move { backend.delete_one(&collection, filter, cancel).await.map(|_| ()) }
        })
        .await
        .map_err(RepoError::Persistence)
    }

    pub async fn list(&self, instance_name: &str, cancel: &CancellationToken) -> Result<Vec<String>, RepoError> {
        let query = FindQuery::new(doc! { "instance_name": instance_name });
        let docs = self.ctx.backend.find_many(&self.ctx.names.paused_trigger_groups(), query, cancel).await.map_err(RepoError::Persistence)?;
        let mut groups: Vec<String> = docs.into_iter().filter_map(|d| d.get_str("group").ok().map(str::to_string)).collect();
        groups.sort();
        Ok(groups)
    }
}

#[cfg(test)]
#[path = "paused_groups_tests.rs"]
mod tests;
