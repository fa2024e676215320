// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Calendar repository (spec §4.3, §4.5 "Store calendar"/"Remove calendar").

use crate::backend::FindQuery;
use crate::context::StorageContext;
use crate::docs::CalendarDocument;
use crate::error::RepoError;
use crate::retry::retry_transient;
use bson::{doc, Document};
use schedstore_core::Calendar;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct CalendarRepository {
    ctx: Arc<StorageContext>,
}

fn pk_filter(instance_name: &str, name: &str) -> Document {
    doc! { "instance_name": instance_name, "name": name }
}

impl CalendarRepository {
    pub fn new(ctx: Arc<StorageContext>) -> Self {
        Self { ctx }
    }

    pub async fn exists(&self, instance_name: &str, name: &str, cancel: &CancellationToken) -> Result<bool, RepoError> {
        Ok(self.get(instance_name, name, cancel).await?.is_some())
    }

    pub async fn get(&self, instance_name: &str, name: &str, cancel: &CancellationToken) -> Result<Option<Calendar>, RepoError> {
        let doc = self
            .ctx
            .backend
            .find_one(&self.ctx.names.calendars(), pk_filter(instance_name, name), cancel)
            .await
            .map_err(RepoError::Persistence)?;
        match doc {
            Some(d) => Ok(Some(bson::from_document::<CalendarDocument>(d)?.calendar)),
            None => Ok(None),
        }
    }

    /// Store calendar (spec §4.5): `AlreadyExists` if present and `replace=false`.
    /// `updateTriggers=true` is the caller's job — it reloads referencing
    /// triggers via [`crate::repo::TriggerRepository::list_by_calendar`] and
    /// recomputes their `next_fire_time` after this write lands.
    pub async fn store(
        &self,
        instance_name: &str,
        name: &str,
        calendar: Calendar,
        replace: bool,
        cancel: &CancellationToken,
    ) -> Result<(), RepoError> {
        if !replace && self.exists(instance_name, name, cancel).await? {
            return Err(RepoError::AlreadyExists);
        }
        let document = bson::to_document(&CalendarDocument::new(instance_name, name, calendar))?;
        let collection = self.ctx.names.calendars();
        retry_transient(&self.ctx.retry, cancel, || {
            let backend = self.ctx.backend.clone();
            let collection = collection.clone();
            let filter = pk_filter(instance_name, name);
            let document = document.clone();
            async move { backend.replace_one(&collection, filter, document, true, cancel).await.map(|_| ()) }
        })
        .await
        .map_err(RepoError::Persistence)
    }

    pub async fn remove(&self, instance_name: &str, name: &str, cancel: &CancellationToken) -> Result<bool, RepoError> {
        let collection = self.ctx.names.calendars();
        let deleted = retry_transient(&self.ctx.retry, cancel, || {
            let backend = self.ctx.backend.clone();
            let collection = collection.clone();
            let filter = pk_filter(instance_name, name);
            async move { backend.delete_one(&collection, filter, cancel).await }
        })
        .await
        .map_err(RepoError::Persistence)?;
        Ok(deleted > 0)
    }

    pub async fn list_names(&self, instance_name: &str, cancel: &CancellationToken) -> Result<Vec<String>, RepoError> {
        let query = FindQuery::new(doc! { "instance_name": instance_name }).projection(doc! { "name": 1 });
        let docs = self.ctx.backend.find_many(&self.ctx.names.calendars(), query, cancel).await.map_err(RepoError::Persistence)?;
        let mut names: Vec<String> = docs.into_iter().filter_map(|d| d.get_str("name").ok().map(str::to_string)).collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
#[path = "calendars_tests.rs"]
mod tests;
