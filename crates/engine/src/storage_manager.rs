// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage managers (spec §4.5) — the policy layer over the entity
//! repositories. Every mutation here runs under `TriggerAccess`; reads pass
//! straight through (spec §5: "reads are permitted without a lock").

use crate::error::EngineError;
use crate::locking::with_trigger_access;
use crate::repos::Repos;
use chrono::{DateTime, Utc};
use schedstore_adapters::DistributedMutex;
use schedstore_core::{
    transition, Calendar, GroupMatcher, Job, JobKey, Recurrence, Trigger, TriggerKey, TriggerState, TransitionEvent, ALL_GROUPS_PAUSED,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct StorageManager {
    repos: Arc<Repos>,
    mutex: Arc<DistributedMutex>,
}

impl StorageManager {
    pub fn new(repos: Arc<Repos>, mutex: Arc<DistributedMutex>) -> Self {
        Self { repos, mutex }
    }

    // ---- jobs --------------------------------------------------------

    pub async fn store_job(&self, job: &Job, replace: bool, cancel: &CancellationToken) -> Result<(), EngineError> {
        with_trigger_access(&self.mutex, cancel, || async { Ok(self.repos.jobs.store(job, replace, cancel).await?) }).await
    }

    /// Remove a job directly. Cascading removal of a non-durable job with no
    /// remaining triggers happens inside [`Self::remove_trigger`]; this entry
    /// point is for an explicit admin-initiated delete.
    pub async fn remove_job(&self, key: &JobKey, cancel: &CancellationToken) -> Result<bool, EngineError> {
        with_trigger_access(&self.mutex, cancel, || async { Ok(self.repos.jobs.remove(key, cancel).await?) }).await
    }

    pub async fn get_job(&self, key: &JobKey, cancel: &CancellationToken) -> Result<Option<Job>, EngineError> {
        Ok(self.repos.jobs.get(key, cancel).await?)
    }

    pub async fn job_exists(&self, key: &JobKey, cancel: &CancellationToken) -> Result<bool, EngineError> {
        Ok(self.repos.jobs.exists(key, cancel).await?)
    }

    pub async fn count_jobs(&self, instance_name: &str, matcher: &GroupMatcher, cancel: &CancellationToken) -> Result<u64, EngineError> {
        Ok(self.repos.jobs.count(instance_name, matcher, cancel).await?)
    }

    pub async fn list_job_keys(&self, instance_name: &str, matcher: &GroupMatcher, cancel: &CancellationToken) -> Result<Vec<JobKey>, EngineError> {
        Ok(self.repos.jobs.list_keys(instance_name, matcher, cancel).await?)
    }

    pub async fn list_job_groups(&self, instance_name: &str, cancel: &CancellationToken) -> Result<Vec<String>, EngineError> {
        Ok(self.repos.jobs.list_groups(instance_name, cancel).await?)
    }

    // ---- triggers ------------------------------------------------------

    /// Store trigger (spec §4.5). `force_state` overrides the
    /// preserve-existing-state-on-replace rule.
    pub async fn store_trigger(&self, trigger: &Trigger, force_state: bool, cancel: &CancellationToken) -> Result<(), EngineError> {
        with_trigger_access(&self.mutex, cancel, || self.store_trigger_locked(trigger, force_state, cancel)).await
    }

    /// Replace trigger (spec §4.5): the new trigger must reference the same
    /// job key as the one it replaces.
    pub async fn replace_trigger(&self, trigger: &Trigger, force_state: bool, cancel: &CancellationToken) -> Result<(), EngineError> {
        with_trigger_access(&self.mutex, cancel, || async {
            let existing = self
                .repos
                .triggers
                .get(&trigger.key, cancel)
                .await?
                .ok_or_else(|| EngineError::Integrity(format!("replace trigger: {} does not exist", trigger.key)))?;
            if existing.job_key != trigger.job_key {
                return Err(EngineError::Integrity(format!(
                    "replace trigger: {} references job {} but existing trigger references {}",
                    trigger.key, trigger.job_key, existing.job_key
                )));
            }
            self.store_trigger_locked(trigger, force_state, cancel).await
        })
        .await
    }

    async fn store_trigger_locked(&self, trigger: &Trigger, force_state: bool, cancel: &CancellationToken) -> Result<(), EngineError> {
        let job = self
            .repos
            .jobs
            .get(&trigger.job_key, cancel)
            .await?
            .ok_or_else(|| EngineError::Integrity(format!("store trigger: job {} does not exist", trigger.job_key)))?;
        let existing = self.repos.triggers.get(&trigger.key, cancel).await?;

        let final_state = match (&existing, force_state) {
            (Some(current), false) => current.state,
            _ => {
                let group_is_paused = self.repos.paused.is_paused(trigger.key.instance_name.as_str(), &trigger.key.group, cancel).await?;
                let job_is_blocked = job.concurrent_execution_disallowed && self.repos.fired.job_is_blocked(&job.key, cancel).await?;
                let initial = transition(TriggerState::Waiting, TransitionEvent::Store { job_is_blocked, group_is_paused })
                    .map_err(|e| EngineError::Integrity(e.to_string()))?;

                if initial == TriggerState::Paused {
                    let all_paused = self.repos.paused.list(trigger.key.instance_name.as_str(), cancel).await?.iter().any(|g| g == ALL_GROUPS_PAUSED);
                    if all_paused {
                        self.repos.paused.mark_paused(trigger.key.instance_name.as_str(), &trigger.key.group, cancel).await?;
                    }
                }
                initial
            }
        };

        let mut to_store = trigger.clone();
        to_store.state = final_state;
        self.repos.triggers.store(&to_store, cancel).await?;
        Ok(())
    }

    /// Remove trigger, cascading the owning job's removal if it's
    /// non-durable and has no remaining triggers (spec §4.5).
    pub async fn remove_trigger(&self, key: &TriggerKey, cancel: &CancellationToken) -> Result<bool, EngineError> {
        with_trigger_access(&self.mutex, cancel, || async {
            let Some(trigger) = self.repos.triggers.get(key, cancel).await? else {
                return Ok(false);
            };
            self.repos.triggers.remove(key, cancel).await?;

            if let Some(job) = self.repos.jobs.get(&trigger.job_key, cancel).await? {
                if !job.durable && self.repos.triggers.list_by_job(&job.key, cancel).await?.is_empty() {
                    self.repos.jobs.remove(&job.key, cancel).await?;
                }
            }
            Ok(true)
        })
        .await
    }

    pub async fn get_trigger(&self, key: &TriggerKey, cancel: &CancellationToken) -> Result<Option<Trigger>, EngineError> {
        Ok(self.repos.triggers.get(key, cancel).await?)
    }

    pub async fn trigger_exists(&self, key: &TriggerKey, cancel: &CancellationToken) -> Result<bool, EngineError> {
        Ok(self.repos.triggers.exists(key, cancel).await?)
    }

    pub async fn count_triggers(&self, instance_name: &str, matcher: &GroupMatcher, cancel: &CancellationToken) -> Result<u64, EngineError> {
        Ok(self.repos.triggers.count(instance_name, matcher, cancel).await?)
    }

    pub async fn list_trigger_keys(&self, instance_name: &str, matcher: &GroupMatcher, cancel: &CancellationToken) -> Result<Vec<TriggerKey>, EngineError> {
        Ok(self.repos.triggers.list_keys(instance_name, matcher, cancel).await?)
    }

    pub async fn list_trigger_groups(&self, instance_name: &str, cancel: &CancellationToken) -> Result<Vec<String>, EngineError> {
        Ok(self.repos.triggers.list_groups(instance_name, cancel).await?)
    }

    // ---- calendars -----------------------------------------------------

    /// Store calendar (spec §4.5). When `update_triggers` is set, every
    /// trigger referencing this calendar gets its `next_fire_time`
    /// recomputed; a recomputed time that has already passed the misfire
    /// threshold is advanced the same way the misfire sweep would rather
    /// than left to fire immediately.
    #[allow(clippy::too_many_arguments)]
    pub async fn store_calendar(
        &self,
        instance_name: &str,
        name: &str,
        calendar: Calendar,
        replace: bool,
        update_triggers: bool,
        misfire_threshold: chrono::Duration,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<(), EngineError> {
        with_trigger_access(&self.mutex, cancel, || async {
            self.repos.calendars.store(instance_name, name, calendar.clone(), replace, cancel).await?;

            if !update_triggers {
                return Ok(());
            }
            let floor = now - misfire_threshold;
            for mut trigger in self.repos.triggers.list_by_calendar(instance_name, name, cancel).await? {
                let recomputed = trigger.recurrence.compute_first_fire_time_utc(Some(&calendar));
                trigger.next_fire_time = match recomputed {
                    Some(t) if t < floor => trigger.recurrence.update_after_misfire(Some(&calendar), now),
                    other => other,
                };
                self.repos.triggers.store(&trigger, cancel).await?;
            }
            Ok(())
        })
        .await
    }

    /// Remove calendar (spec §4.5): rejected while any trigger still
    /// references it.
    pub async fn remove_calendar(&self, instance_name: &str, name: &str, cancel: &CancellationToken) -> Result<bool, EngineError> {
        with_trigger_access(&self.mutex, cancel, || async {
            if !self.repos.triggers.list_by_calendar(instance_name, name, cancel).await?.is_empty() {
                return Err(EngineError::Integrity(format!("calendar {name} is still referenced by a trigger")));
            }
            Ok(self.repos.calendars.remove(instance_name, name, cancel).await?)
        })
        .await
    }

    pub async fn get_calendar(&self, instance_name: &str, name: &str, cancel: &CancellationToken) -> Result<Option<Calendar>, EngineError> {
        Ok(self.repos.calendars.get(instance_name, name, cancel).await?)
    }

    pub async fn calendar_exists(&self, instance_name: &str, name: &str, cancel: &CancellationToken) -> Result<bool, EngineError> {
        Ok(self.repos.calendars.exists(instance_name, name, cancel).await?)
    }

    pub async fn list_calendar_names(&self, instance_name: &str, cancel: &CancellationToken) -> Result<Vec<String>, EngineError> {
        Ok(self.repos.calendars.list_names(instance_name, cancel).await?)
    }

    // ---- group pause/resume --------------------------------------------

    async fn groups_matching(&self, instance_name: &str, matcher: &GroupMatcher, cancel: &CancellationToken) -> Result<Vec<String>, EngineError> {
        Ok(self.repos.triggers.list_groups(instance_name, cancel).await?.into_iter().filter(|g| matcher.matches(g)).collect())
    }

    /// Pause trigger group (spec §4.5): `Waiting`/`Acquired` go `Paused`,
    /// `Executing` goes `PausedBlocked`; every matched group is recorded in
    /// the paused set so triggers stored later under it start `Paused` too.
    pub async fn pause_trigger_group(&self, instance_name: &str, matcher: &GroupMatcher, cancel: &CancellationToken) -> Result<(), EngineError> {
        with_trigger_access(&self.mutex, cancel, || async {
            self.repos
                .triggers
                .bulk_cas_state(instance_name, Some(matcher), &[TriggerState::Waiting, TriggerState::Acquired], TriggerState::Paused, cancel)
                .await?;
            self.repos.triggers.bulk_cas_state(instance_name, Some(matcher), &[TriggerState::Executing], TriggerState::PausedBlocked, cancel).await?;

            for group in self.groups_matching(instance_name, matcher, cancel).await? {
                self.repos.paused.mark_paused(instance_name, &group, cancel).await?;
            }
            Ok(())
        })
        .await
    }

    /// Resume trigger group (spec §4.5): `Paused`/`PausedBlocked` both go
    /// straight to `Waiting` — a group resume does not preserve the
    /// `PausedBlocked -> Executing` signal the individual `Resume` event
    /// would (spec §4.4's design note covers that transition; §4.5's group
    /// resume is explicit that both feed into `Waiting`), so this calls
    /// `bulk_cas_state` directly rather than `transition()`.
    pub async fn resume_trigger_group(&self, instance_name: &str, matcher: &GroupMatcher, cancel: &CancellationToken) -> Result<(), EngineError> {
        with_trigger_access(&self.mutex, cancel, || async {
            for group in self.groups_matching(instance_name, matcher, cancel).await? {
                self.repos.paused.mark_resumed(instance_name, &group, cancel).await?;
            }
            self.repos
                .triggers
                .bulk_cas_state(instance_name, Some(matcher), &[TriggerState::Paused, TriggerState::PausedBlocked], TriggerState::Waiting, cancel)
                .await?;
            Ok(())
        })
        .await
    }

    /// Pause all groups (spec §4.5): applies the same transition as pausing
    /// a single group to the whole instance, and inserts the `<ALL_PAUSED>`
    /// sentinel so groups created afterward start `Paused` too.
    pub async fn pause_all(&self, instance_name: &str, cancel: &CancellationToken) -> Result<(), EngineError> {
        with_trigger_access(&self.mutex, cancel, || async {
            self.repos
                .triggers
                .bulk_cas_state(instance_name, None, &[TriggerState::Waiting, TriggerState::Acquired], TriggerState::Paused, cancel)
                .await?;
            self.repos.triggers.bulk_cas_state(instance_name, None, &[TriggerState::Executing], TriggerState::PausedBlocked, cancel).await?;
            self.repos.paused.mark_paused(instance_name, ALL_GROUPS_PAUSED, cancel).await?;
            Ok(())
        })
        .await
    }

    pub async fn resume_all(&self, instance_name: &str, cancel: &CancellationToken) -> Result<(), EngineError> {
        with_trigger_access(&self.mutex, cancel, || async {
            for group in self.repos.paused.list(instance_name, cancel).await? {
                self.repos.paused.mark_resumed(instance_name, &group, cancel).await?;
            }
            self.repos
                .triggers
                .bulk_cas_state(instance_name, None, &[TriggerState::Paused, TriggerState::PausedBlocked], TriggerState::Waiting, cancel)
                .await?;
            Ok(())
        })
        .await
    }

    /// Clear all scheduling data for an instance (spec §4.7
    /// `ClearAllSchedulingData`): truncates jobs, triggers, calendars, fired
    /// triggers, paused-group flags, and scheduler registrations, all scoped
    /// to `instance_name`.
    pub async fn clear_all(&self, instance_name: &str, cancel: &CancellationToken) -> Result<(), EngineError> {
        with_trigger_access(&self.mutex, cancel, || async {
            for key in self.repos.triggers.list_keys(instance_name, &GroupMatcher::Anything, cancel).await? {
                self.repos.triggers.remove(&key, cancel).await?;
            }
            for key in self.repos.jobs.list_keys(instance_name, &GroupMatcher::Anything, cancel).await? {
                self.repos.jobs.remove(&key, cancel).await?;
            }
            for name in self.repos.calendars.list_names(instance_name, cancel).await? {
                self.repos.calendars.remove(instance_name, &name, cancel).await?;
            }
            for group in self.repos.paused.list(instance_name, cancel).await? {
                self.repos.paused.mark_resumed(instance_name, &group, cancel).await?;
            }
            self.repos.fired.remove_all(instance_name, cancel).await?;
            self.repos.schedulers.remove_all(instance_name, cancel).await?;
            Ok(())
        })
        .await
    }

    /// Reserved (spec §4.5/§7): group-pause introspection isn't implemented
    /// — a caller wanting this has to list groups and cross-reference the
    /// paused set itself via [`Self::list_trigger_groups`]/the paused-set
    /// query exposed through the daemon.
    pub fn is_trigger_group_paused(&self) -> Result<bool, EngineError> {
        Err(EngineError::NotImplemented("is_trigger_group_paused"))
    }

    pub fn is_job_group_paused(&self) -> Result<bool, EngineError> {
        Err(EngineError::NotImplemented("is_job_group_paused"))
    }
}

#[cfg(test)]
#[path = "storage_manager_tests.rs"]
mod tests;
