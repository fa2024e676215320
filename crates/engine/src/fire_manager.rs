// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The fire manager (spec §4.6) — trigger acquisition, firing hand-off,
//! completion, and the misfire recovery sweep. Every operation here runs
//! under `TriggerAccess`, same as the storage managers.

use crate::error::EngineError;
use crate::listener::{FireListener, NoopFireListener};
use crate::locking::with_trigger_access;
use crate::repos::Repos;
use chrono::{DateTime, Utc};
use schedstore_adapters::DistributedMutex;
use schedstore_core::{
    transition, Calendar, Clock, CompletionInstruction, FiredInstanceId, FiredTrigger, GroupMatcher, InstanceId, Job, Recurrence, Trigger, TriggerKey,
    TriggerState, TransitionEvent,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// The bundle a worker pool needs to actually run a fired trigger (spec
/// §4.6.3's `TriggersFired` return value).
pub struct FireBundle {
    pub job: Job,
    pub trigger: Trigger,
    pub calendar: Option<Calendar>,
    pub fired: FiredTrigger,
}

impl FireBundle {
    /// The job's data map overlaid by the trigger's (spec §3 supplement) —
    /// what the worker pool actually hands to the executed job.
    pub fn effective_data(&self) -> HashMap<String, String> {
        self.job.merged_data(&self.trigger.data)
    }
}

/// Outcome of a misfire recovery pass (spec §4.6.5).
#[derive(Debug, Clone, Copy, Default)]
pub struct MisfireSweepResult {
    pub handled: u64,
    pub has_more_misfired_triggers: bool,
    pub earliest_new_fire_time: Option<DateTime<Utc>>,
}

pub struct FireManager<C: Clock> {
    repos: Arc<Repos>,
    mutex: Arc<DistributedMutex>,
    clock: C,
    instance_id: InstanceId,
    listener: Arc<dyn FireListener>,
}

impl<C: Clock> FireManager<C> {
    pub fn new(repos: Arc<Repos>, mutex: Arc<DistributedMutex>, clock: C, instance_id: InstanceId) -> Self {
        Self { repos, mutex, clock, instance_id, listener: Arc::new(NoopFireListener) }
    }

    pub fn with_listener(mut self, listener: Arc<dyn FireListener>) -> Self {
        self.listener = listener;
        self
    }

    /// `AcquireNextTriggers` (spec §4.6.1). Candidates already acquired
    /// before `cancel` fires are kept — the caller must fire or release
    /// them, they are never rolled back here.
    pub async fn acquire_next_triggers(
        &self,
        instance_name: &str,
        no_later_than: DateTime<Utc>,
        max_count: i64,
        time_window: chrono::Duration,
        misfire_threshold: chrono::Duration,
        cancel: &CancellationToken,
    ) -> Result<Vec<Trigger>, EngineError> {
        with_trigger_access(&self.mutex, cancel, || async {
            let now = self.clock.now_utc();
            let candidates = self
                .repos
                .triggers
                .acquire_candidates(instance_name, now, no_later_than, time_window, misfire_threshold, max_count, cancel)
                .await?;

            let mut acquired = Vec::with_capacity(candidates.len());
            for key in candidates {
                if cancel.is_cancelled() {
                    break;
                }
                if self.repos.triggers.cas_state(&key, TriggerState::Waiting, TriggerState::Acquired, cancel).await? {
                    if let Some(trigger) = self.repos.triggers.get(&key, cancel).await? {
                        acquired.push(trigger);
                    }
                }
            }
            Ok(acquired)
        })
        .await
    }

    /// `ReleaseAcquiredTrigger` (spec §4.6.2) — idempotent: a trigger no
    /// longer `Acquired` (already fired, already released) is a silent no-op.
    pub async fn release_acquired_trigger(&self, key: &TriggerKey, cancel: &CancellationToken) -> Result<(), EngineError> {
        with_trigger_access(&self.mutex, cancel, || async {
            self.repos.triggers.cas_state(key, TriggerState::Acquired, TriggerState::Waiting, cancel).await?;
            Ok(())
        })
        .await
    }

    /// `TriggersFired` (spec §4.6.3) — one lock acquisition for the whole
    /// batch; each trigger's outcome is isolated so one bad candidate
    /// doesn't abort the others.
    pub async fn triggers_fired(&self, keys: &[TriggerKey], cancel: &CancellationToken) -> Result<Vec<Result<FireBundle, EngineError>>, EngineError> {
        with_trigger_access(&self.mutex, cancel, || async {
            let mut results = Vec::with_capacity(keys.len());
            for key in keys {
                results.push(self.fire_one(key, cancel).await);
            }
            Ok(results)
        })
        .await
    }

    async fn fire_one(&self, key: &TriggerKey, cancel: &CancellationToken) -> Result<FireBundle, EngineError> {
        let trigger = self.repos.triggers.get(key, cancel).await?.ok_or_else(|| EngineError::Integrity(format!("trigger {key} vanished before firing")))?;
        let job = self
            .repos
            .jobs
            .get(&trigger.job_key, cancel)
            .await?
            .ok_or_else(|| EngineError::Integrity(format!("job {} vanished before firing", trigger.job_key)))?;
        let calendar = match &trigger.calendar_name {
            Some(name) => self.repos.calendars.get(key.instance_name.as_str(), name, cancel).await?,
            None => None,
        };

        if !self.repos.triggers.cas_state(key, TriggerState::Acquired, TriggerState::Executing, cancel).await? {
            return Err(EngineError::Integrity(format!("trigger {key} was not Acquired when fired")));
        }

        let now = self.clock.now_utc();
        let utc_ticks = now.timestamp_micros();
        let fired_id = FiredInstanceId::new(key, self.instance_id.clone(), utc_ticks);
        let fired = FiredTrigger {
            id: fired_id,
            instance_id: self.instance_id.clone(),
            trigger_key: key.clone(),
            job_key: job.key.clone(),
            fired_time: now,
            scheduled_fire_time: trigger.next_fire_time.unwrap_or(now),
            requests_recovery: job.requests_recovery,
            concurrent_execution_disallowed: job.concurrent_execution_disallowed,
            priority: trigger.priority,
        };
        self.repos.fired.insert(key.instance_name.as_str(), &fired, cancel).await?;

        let mut fired_trigger = trigger;
        fired_trigger.state = TriggerState::Executing;
        Ok(FireBundle { job, trigger: fired_trigger, calendar, fired })
    }

    /// `TriggeredJobComplete` (spec §4.6.4). Loads the trigger and its job
    /// itself so callers only need the key and the worker's outcome.
    pub async fn triggered_job_complete(
        &self,
        key: &TriggerKey,
        instruction: CompletionInstruction,
        updated_job_data: Option<HashMap<String, String>>,
        cancel: &CancellationToken,
    ) -> Result<(), EngineError> {
        with_trigger_access(&self.mutex, cancel, || async {
            let trigger = self.repos.triggers.get(key, cancel).await?.ok_or_else(|| EngineError::Integrity(format!("trigger {key} does not exist")))?;
            let job = self
                .repos
                .jobs
                .get(&trigger.job_key, cancel)
                .await?
                .ok_or_else(|| EngineError::Integrity(format!("job {} does not exist", trigger.job_key)))?;

            match instruction {
                CompletionInstruction::SetAllGroupComplete => {
                    self.repos
                        .triggers
                        .bulk_cas_state(
                            key.instance_name.as_str(),
                            Some(&GroupMatcher::Equals(key.group.clone())),
                            &[
                                TriggerState::Waiting,
                                TriggerState::Acquired,
                                TriggerState::Executing,
                                TriggerState::Paused,
                                TriggerState::PausedBlocked,
                                TriggerState::Error,
                            ],
                            TriggerState::Complete,
                            cancel,
                        )
                        .await?;
                }
                CompletionInstruction::Delete => {
                    let target = transition(TriggerState::Executing, TransitionEvent::Complete(instruction)).map_err(|e| EngineError::Integrity(e.to_string()))?;
                    if !self.repos.triggers.cas_state(key, TriggerState::Executing, target, cancel).await? {
                        return Err(EngineError::Integrity(format!("trigger {key} was not Executing on completion")));
                    }
                    self.repos.triggers.remove(key, cancel).await?;
                    if !job.durable && self.repos.triggers.list_by_job(&job.key, cancel).await?.is_empty() {
                        self.repos.jobs.remove(&job.key, cancel).await?;
                    }
                }
                CompletionInstruction::SetComplete | CompletionInstruction::SetError | CompletionInstruction::Default => {
                    let target = transition(TriggerState::Executing, TransitionEvent::Complete(instruction)).map_err(|e| EngineError::Integrity(e.to_string()))?;
                    if !self.repos.triggers.cas_state(key, TriggerState::Executing, target, cancel).await? {
                        return Err(EngineError::Integrity(format!("trigger {key} was not Executing on completion")));
                    }
                }
            }

            self.repos.fired.remove_for_trigger_instance(key.instance_name.as_str(), key, &self.instance_id, cancel).await?;

            if job.persist_data_after_execution {
                if let Some(data) = updated_job_data {
                    let mut updated_job = job.clone();
                    updated_job.data = data;
                    self.repos.jobs.store(&updated_job, true, cancel).await?;
                }
            }

            if job.concurrent_execution_disallowed {
                for sibling in self.repos.triggers.list_by_job(&job.key, cancel).await? {
                    match sibling.state {
                        TriggerState::PausedBlocked => {
                            self.repos.triggers.cas_state(&sibling.key, TriggerState::PausedBlocked, TriggerState::Paused, cancel).await?;
                        }
                        TriggerState::Executing => {
                            self.repos.triggers.cas_state(&sibling.key, TriggerState::Executing, TriggerState::Waiting, cancel).await?;
                        }
                        _ => {}
                    }
                }
            }
            Ok(())
        })
        .await
    }

    /// Misfire recovery sweep (spec §4.6.5). `recovering=true` (used only by
    /// `SchedulerStarted`, spec §4.7) keeps a misfired trigger in its current
    /// state instead of forcing it back to `Waiting` — startup recovery is
    /// still deciding what else needs to happen to that trigger.
    pub async fn run_misfire_sweep(
        &self,
        instance_name: &str,
        misfire_threshold: chrono::Duration,
        max_misfires_at_a_time: i64,
        recovering: bool,
        cancel: &CancellationToken,
    ) -> Result<MisfireSweepResult, EngineError> {
        with_trigger_access(&self.mutex, cancel, || async {
            let now = self.clock.now_utc();
            let floor = now - misfire_threshold;

            let total = self.repos.triggers.count_misfired(instance_name, floor, cancel).await?;
            if total == 0 {
                return Ok(MisfireSweepResult::default());
            }

            let candidates = self.repos.triggers.misfire_candidates(instance_name, floor, max_misfires_at_a_time, cancel).await?;
            let mut earliest_new_fire_time = None;
            let mut handled = 0u64;

            for mut trigger in candidates {
                self.listener.notify_trigger_misfired(&trigger);

                let calendar = match &trigger.calendar_name {
                    Some(name) => self.repos.calendars.get(instance_name, name, cancel).await?,
                    None => None,
                };
                let previous_fire_time = trigger.next_fire_time;
                let recomputed = trigger.recurrence.update_after_misfire(calendar.as_ref(), now);

                // `misfire_candidates` only ever selects `Waiting` rows, so
                // `recovering` has no distinct target state to preserve here
                // (the non-recovering path would also land back on
                // `Waiting`) — it's threaded through for the same reason the
                // spec names it: a future candidate query broadened to other
                // pre-paused states would need it to avoid overwriting them.
                let target = transition(trigger.state, TransitionEvent::Misfire { has_next_fire: recomputed.is_some() })
                    .map_err(|e| EngineError::Integrity(e.to_string()))?;
                let target = if recovering && target != TriggerState::Complete { trigger.state } else { target };

                self.repos.triggers.cas_state_with_fire_times(&trigger.key, trigger.state, target, recomputed, previous_fire_time, cancel).await?;

                if target == TriggerState::Complete {
                    self.listener.notify_scheduler_listeners_finalized(&trigger);
                } else if let Some(next) = recomputed {
                    earliest_new_fire_time = Some(earliest_new_fire_time.map_or(next, |e: DateTime<Utc>| e.min(next)));
                }

                trigger.next_fire_time = recomputed;
                handled += 1;
            }

            if handled == 0 {
                warn!(instance_name, total, "misfire sweep found eligible rows but selected none (max_misfires_at_a_time too low?)");
            }

            Ok(MisfireSweepResult {
                handled,
                has_more_misfired_triggers: total > handled,
                earliest_new_fire_time,
            })
        })
        .await
    }
}

#[cfg(test)]
#[path = "fire_manager_tests.rs"]
mod tests;
