// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job repository (spec §4.3, §4.5 "Store job").

use crate::backend::FindQuery;
use crate::context::StorageContext;
use crate::docs::JobDocument;
use crate::error::RepoError;
use crate::group_matcher_compiler;
use crate::retry::retry_transient;
use bson::{doc, Document};
use schedstore_core::{GroupMatcher, Job, JobKey};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct JobRepository {
    ctx: Arc<StorageContext>,
}

fn pk_filter(key: &JobKey) -> Document {
    doc! {
        "instance_name": key.instance_name.as_str(),
        "group": &key.group,
        "name": &key.name,
    }
}

impl JobRepository {
    pub fn new(ctx: Arc<StorageContext>) -> Self {
        Self { ctx }
    }

    pub async fn exists(&self, key: &JobKey, cancel: &CancellationToken) -> Result<bool, RepoError> {
        Ok(self.get(key, cancel).await?.is_some())
    }

    pub async fn get(&self, key: &JobKey, cancel: &CancellationToken) -> Result<Option<Job>, RepoError> {
        let doc = self
            .ctx
            .backend
            .find_one(&self.ctx.names.jobs(), pk_filter(key), cancel)
            .await
            .map_err(RepoError::Persistence)?;
        match doc {
            Some(d) => Ok(Some(bson::from_document::<JobDocument>(d)?.into())),
            None => Ok(None),
        }
    }

    /// Store job (spec §4.5): `AlreadyExists` if present and `replace=false`.
    pub async fn store(&self, job: &Job, replace: bool, cancel: &CancellationToken) -> Result<(), RepoError> {
        if !replace && self.exists(&job.key, cancel).await? {
            return Err(RepoError::AlreadyExists);
        }
        let document = bson::to_document(&JobDocument::from(job))?;
        let collection = self.ctx.names.jobs();
        retry_transient(&self.ctx.retry, cancel, || {
            let backend = self.ctx.backend.clone();
            let collection = collection.clone();
            let filter = pk_filter(&job.key);
            let document = document.clone();
            async move { backend.replace_one(&collection, filter, document, true, cancel).await.map(|_| ()) }
        })
        .await
        .map_err(RepoError::Persistence)
    }

    pub async fn remove(&self, key: &JobKey, cancel: &CancellationToken) -> Result<bool, RepoError> {
        let collection = self.ctx.names.jobs();
        let deleted = retry_transient(&self.ctx.retry, cancel, || {
            let backend = self.ctx.backend.clone();
            let collection = collection.clone();
            let filter = pk_filter(key);
            async move { backend.delete_one(&collection, filter, cancel).await }
        })
        .await
        .map_err(RepoError::Persistence)?;
        Ok(deleted > 0)
    }

    fn group_filter(instance_name: &str, matcher: &GroupMatcher) -> Document {
        let regex = group_matcher_compiler::compile(matcher);
        doc! {
            "instance_name": instance_name,
            "group": { "$regex": regex.as_str() },
        }
    }

    pub async fn count(
        &self,
        instance_name: &str,
        matcher: &GroupMatcher,
        cancel: &CancellationToken,
    ) -> Result<u64, RepoError> {
        self.ctx
            .backend
            .count(&self.ctx.names.jobs(), Self::group_filter(instance_name, matcher), cancel)
            .await
            .map_err(RepoError::Persistence)
    }

    pub async fn list_keys(
        &self,
        instance_name: &str,
        matcher: &GroupMatcher,
        cancel: &CancellationToken,
    ) -> Result<Vec<JobKey>, RepoError> {
        let query = FindQuery::new(Self::group_filter(instance_name, matcher));
        let docs = self.ctx.backend.find_many(&self.ctx.names.jobs(), query, cancel).await.map_err(RepoError::Persistence)?;
        docs.into_iter()
            .map(|d| Ok(bson::from_document::<JobDocument>(d)?.into_job_key()))
            .collect()
    }

    pub async fn list_groups(&self, instance_name: &str, cancel: &CancellationToken) -> Result<Vec<String>, RepoError> {
        let query = FindQuery::new(doc! { "instance_name": instance_name }).projection(doc! { "group": 1 });
        let docs = self.ctx.backend.find_many(&self.ctx.names.jobs(), query, cancel).await.map_err(RepoError::Persistence)?;
        let mut groups: Vec<String> =
            docs.into_iter().filter_map(|d| d.get_str("group").ok().map(str::to_string)).collect();
        groups.sort();
        groups.dedup();
        Ok(groups)
    }
}

impl JobDocument {
    fn into_job_key(self) -> JobKey {
        JobKey::new(self.instance_name, self.group, self.name)
    }
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
