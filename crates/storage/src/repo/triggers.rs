// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger repository (spec §4.3) — also home to the acquisition query and
//! the conditional (CAS) primitives C5/C6 build the state machine's
//! transitions on top of.

use crate::backend::FindQuery;
use crate::context::StorageContext;
use crate::docs::TriggerDocument;
use crate::error::RepoError;
use crate::group_matcher_compiler;
use crate::retry::retry_transient;
use bson::{doc, Document};
use chrono::{DateTime, Utc};
use schedstore_core::{GroupMatcher, JobKey, Trigger, TriggerKey, TriggerState};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct TriggerRepository {
    ctx: Arc<StorageContext>,
}

fn pk_filter(key: &TriggerKey) -> Document {
    doc! {
        "instance_name": key.instance_name.as_str(),
        "group": &key.group,
        "name": &key.name,
    }
}

fn state_doc(state: TriggerState) -> bson::Bson {
    bson::to_bson(&state).unwrap_or_else(|_| bson::Bson::String(state.to_string()))
}

impl TriggerRepository {
    pub fn new(ctx: Arc<StorageContext>) -> Self {
        Self { ctx }
    }

    pub async fn exists(&self, key: &TriggerKey, cancel: &CancellationToken) -> Result<bool, RepoError> {
        Ok(self.get(key, cancel).await?.is_some())
    }

    pub async fn get(&self, key: &TriggerKey, cancel: &CancellationToken) -> Result<Option<Trigger>, RepoError> {
        let doc = self
            .ctx
            .backend
            .find_one(&self.ctx.names.triggers(), pk_filter(key), cancel)
            .await
            .map_err(RepoError::Persistence)?;
        match doc {
            Some(d) => Ok(Some(bson::from_document::<TriggerDocument>(d)?.into())),
            None => Ok(None),
        }
    }

    /// Upsert the full trigger document. Initial-state policy (paused group,
    /// blocked job, `forceState`) is decided by the caller before this runs
    /// (spec §4.5 "Store trigger").
    pub async fn store(&self, trigger: &Trigger, cancel: &CancellationToken) -> Result<(), RepoError> {
        let document = bson::to_document(&TriggerDocument::from(trigger))?;
        let collection = self.ctx.names.triggers();
        retry_transient(&self.ctx.retry, cancel, || {
            let backend = self.ctx.backend.clone();
            let collection = collection.clone();
            let filter = pk_filter(&trigger.key);
            let document = document.clone();
            async move { backend.replace_one(&collection, filter, document, true, cancel).await.map(|_| ()) }
        })
        .await
        .map_err(RepoError::Persistence)
    }

    pub async fn remove(&self, key: &TriggerKey, cancel: &CancellationToken) -> Result<bool, RepoError> {
        let collection = self.ctx.names.triggers();
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

    pub async fn count(&self, instance_name: &str, matcher: &GroupMatcher, cancel: &CancellationToken) -> Result<u64, RepoError> {
        self.ctx
            .backend
            .count(&self.ctx.names.triggers(), Self::group_filter(instance_name, matcher), cancel)
            .await
            .map_err(RepoError::Persistence)
    }

    pub async fn list_keys(
        &self,
        instance_name: &str,
        matcher: &GroupMatcher,
        cancel: &CancellationToken,
    ) -> Result<Vec<TriggerKey>, RepoError> {
        let query = FindQuery::new(Self::group_filter(instance_name, matcher));
        let docs = self.ctx.backend.find_many(&self.ctx.names.triggers(), query, cancel).await.map_err(RepoError::Persistence)?;
        docs.into_iter().map(|d| Ok(bson::from_document::<TriggerDocument>(d)?.into_trigger_key())).collect()
    }

    pub async fn list_groups(&self, instance_name: &str, cancel: &CancellationToken) -> Result<Vec<String>, RepoError> {
        let query = FindQuery::new(doc! { "instance_name": instance_name }).projection(doc! { "group": 1 });
        let docs = self.ctx.backend.find_many(&self.ctx.names.triggers(), query, cancel).await.map_err(RepoError::Persistence)?;
        let mut groups: Vec<String> = docs.into_iter().filter_map(|d| d.get_str("group").ok().map(str::to_string)).collect();
        groups.sort();
        groups.dedup();
        Ok(groups)
    }

    pub async fn list_by_job(&self, job_key: &JobKey, cancel: &CancellationToken) -> Result<Vec<Trigger>, RepoError> {
        let filter = doc! {
            "job_instance_name": job_key.instance_name.as_str(),
            "job_group": &job_key.group,
            "job_name": &job_key.name,
        };
        let docs = self.ctx.backend.find_many(&self.ctx.names.triggers(), FindQuery::new(filter), cancel).await.map_err(RepoError::Persistence)?;
        docs.into_iter().map(|d| Ok(bson::from_document::<TriggerDocument>(d)?.into())).collect()
    }

    pub async fn list_by_calendar(
        &self,
        instance_name: &str,
        calendar_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Trigger>, RepoError> {
        let filter = doc! { "instance_name": instance_name, "calendar_name": calendar_name };
        let docs = self.ctx.backend.find_many(&self.ctx.names.triggers(), FindQuery::new(filter), cancel).await.map_err(RepoError::Persistence)?;
        docs.into_iter().map(|d| Ok(bson::from_document::<TriggerDocument>(d)?.into())).collect()
    }

    /// Conditional `old_state -> new_state` transition (spec §4.4: "all
    /// state writes MUST be conditional"). Returns whether the CAS won.
    pub async fn cas_state(
        &self,
        key: &TriggerKey,
        expected: TriggerState,
        new: TriggerState,
        cancel: &CancellationToken,
    ) -> Result<bool, RepoError> {
        let mut filter = pk_filter(key);
        filter.insert("state", state_doc(expected));
        let update = doc! { "$set": { "state": state_doc(new) } };
        let collection = self.ctx.names.triggers();
        let outcome = retry_transient(&self.ctx.retry, cancel, || {
            let backend = self.ctx.backend.clone();
            let collection = collection.clone();
            let filter = filter.clone();
            let update = update.clone();
            async move { backend.update_one(&collection, filter, update, cancel).await }
        })
        .await
        .map_err(RepoError::Persistence)?;
        Ok(outcome.cas_won())
    }

    /// CAS plus fire-time bookkeeping in the same conditional write (misfire
    /// recovery and `TriggersFired`'s scheduled-time refresh, spec §4.6.5).
    #[allow(clippy::too_many_arguments)]
    pub async fn cas_state_with_fire_times(
        &self,
        key: &TriggerKey,
        expected: TriggerState,
        new: TriggerState,
        next_fire_time: Option<DateTime<Utc>>,
        previous_fire_time: Option<DateTime<Utc>>,
        cancel: &CancellationToken,
    ) -> Result<bool, RepoError> {
        let mut filter = pk_filter(key);
        filter.insert("state", state_doc(expected));
        let mut set = doc! { "state": state_doc(new) };
        match next_fire_time {
            Some(t) => {
                set.insert("next_fire_time", bson::DateTime::from_chrono(t));
            }
            None => {
                set.insert("next_fire_time", bson::Bson::Null);
            }
        }
        if let Some(t) = previous_fire_time {
            set.insert("previous_fire_time", bson::DateTime::from_chrono(t));
        }
        let update = doc! { "$set": set };
        let collection = self.ctx.names.triggers();
        let outcome = retry_transient(&self.ctx.retry, cancel, || {
            let backend = self.ctx.backend.clone();
            let collection = collection.clone();
            let filter = filter.clone();
            let update = update.clone();
            async move { backend.update_one(&collection, filter, update, cancel).await }
        })
        .await
        .map_err(RepoError::Persistence)?;
        Ok(outcome.cas_won())
    }

    /// Bulk `from -> to` transition, optionally scoped to a single group
    /// (spec §4.5 pause/resume group; `matcher = None` scopes to the whole
    /// instance_name, used by startup crash recovery, spec §4.7).
    pub async fn bulk_cas_state(
        &self,
        instance_name: &str,
        matcher: Option<&GroupMatcher>,
        from: &[TriggerState],
        to: TriggerState,
        cancel: &CancellationToken,
    ) -> Result<u64, RepoError> {
        let mut filter = match matcher {
            Some(m) => Self::group_filter(instance_name, m),
            None => doc! { "instance_name": instance_name },
        };
        let from_bson: Vec<bson::Bson> = from.iter().map(|s| state_doc(*s)).collect();
        filter.insert("state", doc! { "$in": from_bson });
        let update = doc! { "$set": { "state": state_doc(to) } };
        let collection = self.ctx.names.triggers();
        let outcome = retry_transient(&self.ctx.retry, cancel, || {
            let backend = self.ctx.backend.clone();
            let collection = collection.clone();
            let filter = filter.clone();
            let update = update.clone();
            async move { backend.update_many(&collection, filter, update, cancel).await }
        })
        .await
        .map_err(RepoError::Persistence)?;
        Ok(outcome.modified)
    }

    /// Delete every trigger currently in `state` (spec §4.7 `SchedulerStarted`
    /// recovery step "remove all triggers in state Complete").
    pub async fn remove_by_state(&self, instance_name: &str, state: TriggerState, cancel: &CancellationToken) -> Result<u64, RepoError> {
        let filter = doc! { "instance_name": instance_name, "state": state_doc(state) };
        let collection = self.ctx.names.triggers();
        retry_transient(&self.ctx.retry, cancel, || {
            let backend = self.ctx.backend.clone();
            let collection = collection.clone();
            let filter = filter.clone();
            async move { backend.delete_many(&collection, filter, cancel).await }
        })
        .await
        .map_err(RepoError::Persistence)
    }

    /// The acquisition query (spec §4.3 specialty). Returns candidate keys
    /// in `(next_fire_time asc, priority desc)` order; the caller attempts a
    /// per-candidate CAS `Waiting -> Acquired` (spec §4.6.1).
    pub async fn acquire_candidates(
        &self,
        instance_name: &str,
        now: DateTime<Utc>,
        no_later_than: DateTime<Utc>,
        time_window: chrono::Duration,
        misfire_threshold: chrono::Duration,
        max_count: i64,
        cancel: &CancellationToken,
    ) -> Result<Vec<TriggerKey>, RepoError> {
        let ceiling = no_later_than + time_window;
        let misfire_floor = now - misfire_threshold;
        let filter = doc! {
            "instance_name": instance_name,
            "state": state_doc(TriggerState::Waiting),
            "next_fire_time": { "$lte": bson::DateTime::from_chrono(ceiling) },
            "$or": [
                { "misfire_instruction": schedstore_core::MisfireInstruction::IGNORE.0 },
                { "next_fire_time": { "$gte": bson::DateTime::from_chrono(misfire_floor) } },
            ],
        };
        let query = FindQuery::new(filter).sort(doc! { "next_fire_time": 1, "priority": -1 }).limit(max_count);
        let docs = self.ctx.backend.find_many(&self.ctx.names.triggers(), query, cancel).await.map_err(RepoError::Persistence)?;
        docs.into_iter().map(|d| Ok(bson::from_document::<TriggerDocument>(d)?.into_trigger_key())).collect()
    }

    /// Candidates for the misfire sweep (spec §4.6.5 steps 2-3): `Waiting`,
    /// not ignoring misfire policy, scheduled strictly before `floor`.
    pub async fn misfire_candidates(
        &self,
        instance_name: &str,
        floor: DateTime<Utc>,
        max_count: i64,
        cancel: &CancellationToken,
    ) -> Result<Vec<Trigger>, RepoError> {
        let filter = doc! {
            "instance_name": instance_name,
            "state": state_doc(TriggerState::Waiting),
            "misfire_instruction": { "$ne": schedstore_core::MisfireInstruction::IGNORE.0 },
            "next_fire_time": { "$lt": bson::DateTime::from_chrono(floor) },
        };
        let query = FindQuery::new(filter).sort(doc! { "next_fire_time": 1, "priority": -1 }).limit(max_count);
        let docs = self.ctx.backend.find_many(&self.ctx.names.triggers(), query, cancel).await.map_err(RepoError::Persistence)?;
        docs.into_iter().map(|d| Ok(bson::from_document::<TriggerDocument>(d)?.into())).collect()
    }

    pub async fn count_misfired(&self, instance_name: &str, floor: DateTime<Utc>, cancel: &CancellationToken) -> Result<u64, RepoError> {
        let filter = doc! {
            "instance_name": instance_name,
            "state": state_doc(TriggerState::Waiting),
            "misfire_instruction": { "$ne": schedstore_core::MisfireInstruction::IGNORE.0 },
            "next_fire_time": { "$lt": bson::DateTime::from_chrono(floor) },
        };
        self.ctx.backend.count(&self.ctx.names.triggers(), filter, cancel).await.map_err(RepoError::Persistence)
    }
}

impl TriggerDocument {
    fn into_trigger_key(self) -> TriggerKey {
        TriggerKey::new(self.instance_name, self.group, self.name)
    }
}

#[cfg(test)]
#[path = "triggers_tests.rs"]
mod tests;
