// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The lifecycle coordinator (spec §4.7, C7) — wires `schedstore-storage`'s
//! repositories and `schedstore-engine`'s managers to a concrete backend,
//! runs startup crash recovery, and owns the background misfire sweeper.

use crate::config::Config;
use crate::error::LifecycleError;
use chrono::Utc;
use schedstore_adapters::{DistributedMutex, MongoBackend};
use schedstore_core::{
    LockType, MisfireInstruction, RecurrenceRule, SchedulerRegistration, SchedulerRegistrationState, SimpleTrigger, SystemClock, Trigger, TriggerKey,
    TriggerState,
};
use schedstore_engine::{FireManager, Repos, StorageManager};
use schedstore_storage::{CollectionNames, StorageContext, StoreBackend};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

const SWEEPER_SLEEP_FLOOR: StdDuration = StdDuration::from_millis(50);

struct Sweeper {
    shutdown: CancellationToken,
    join: JoinHandle<()>,
}

/// One scheduler instance's live handle on its cluster (spec §4.7).
pub struct Coordinator {
    config: Config,
    repos: Arc<Repos>,
    mutex: Arc<DistributedMutex>,
    storage: StorageManager,
    fire: Arc<FireManager<SystemClock>>,
    sweeper: Option<Sweeper>,
}

impl Coordinator {
    /// `Initialize` (spec §4.7) against a real MongoDB deployment.
    pub async fn connect(config: Config) -> Result<Self, LifecycleError> {
        let database = config.database_name()?;
        let backend = MongoBackend::connect(&config.connection_string, &database).await.map_err(|e| LifecycleError::Connect(e.to_string()))?;
        Self::new(Arc::new(backend), config).await
    }

    /// `Initialize` (spec §4.7) against any [`StoreBackend`] — the entry
    /// point the daemon's own tests use with `MemoryBackend`.
    pub async fn new(backend: Arc<dyn StoreBackend>, config: Config) -> Result<Self, LifecycleError> {
        let names = CollectionNames::new(config.collection_prefix.clone());
        let ctx = StorageContext::new(backend.clone(), names);
        ctx.ensure_indexes().await.map_err(schedstore_engine::EngineError::from)?;
        let locks_collection = ctx.names.locks();

        let repos = Arc::new(Repos::new(ctx));
        let mutex = Arc::new(DistributedMutex::new(backend, locks_collection, config.instance_name.clone(), config.instance_id.clone()));
        let storage = StorageManager::new(repos.clone(), mutex.clone());
        let fire = Arc::new(FireManager::new(repos.clone(), mutex.clone(), SystemClock, config.instance_id.clone()));

        Ok(Self { config, repos, mutex, storage, fire, sweeper: None })
    }

    pub fn storage(&self) -> &StorageManager {
        &self.storage
    }

    pub fn fire(&self) -> &Arc<FireManager<SystemClock>> {
        &self.fire
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Direct repository access for read-only reporting (`schedstore-cli`'s
    /// `status`/`jobs`/`triggers` subcommands) that has no `StorageManager`
    /// equivalent, e.g. listing every scheduler registration in a cluster.
    pub fn repos(&self) -> &Arc<Repos> {
        &self.repos
    }

    pub fn mutex(&self) -> &Arc<DistributedMutex> {
        &self.mutex
    }

    /// `SchedulerStarted` (spec §4.7): registers this instance, runs crash
    /// recovery, then launches the background sweeper.
    pub async fn scheduler_started(&mut self, cancel: &CancellationToken) -> Result<(), LifecycleError> {
        let registration = SchedulerRegistration {
            instance_name: self.config.instance_name.clone(),
            instance_id: self.config.instance_id.clone(),
            state: SchedulerRegistrationState::Started,
            last_check_in: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            cluster_check_in_interval: self.config.db_retry_interval,
        };
        self.repos.schedulers.upsert(&registration, cancel).await.map_err(schedstore_engine::EngineError::from)?;

        self.recover_from_crash(cancel).await?;

        info!(instance_name = %self.config.instance_name, instance_id = %self.config.instance_id, "scheduler started, recovery complete");
        self.spawn_sweeper();
        Ok(())
    }

    /// Spec §4.7 step 1, one `TriggerAccess` critical section: reclaim
    /// state stuck by a crash, synthesize recovery triggers for this
    /// instance's abandoned fires, and drop the bookkeeping rows they came
    /// from. The initial misfire sweep (step 1's last two bullets) runs as
    /// its own, separately-locked call right after — `run_misfire_sweep`
    /// already takes `TriggerAccess` itself, and this method's own section
    /// isn't reentrant-safe to nest it inside.
    async fn recover_from_crash(&self, cancel: &CancellationToken) -> Result<(), LifecycleError> {
        let instance_name = self.config.instance_name.as_str();

        let guard = self.mutex.acquire(LockType::TriggerAccess, cancel).await.map_err(schedstore_engine::EngineError::from)?;
        let result: Result<(), LifecycleError> = async {
            self.repos
                .triggers
                .bulk_cas_state(instance_name, None, &[TriggerState::Acquired, TriggerState::Executing], TriggerState::Waiting, cancel)
                .await
                .map_err(schedstore_engine::EngineError::from)?;
            self.repos
                .triggers
                .bulk_cas_state(instance_name, None, &[TriggerState::PausedBlocked], TriggerState::Paused, cancel)
                .await
                .map_err(schedstore_engine::EngineError::from)?;

            let abandoned = self.repos.fired.list_by_instance(instance_name, &self.config.instance_id, cancel).await.map_err(schedstore_engine::EngineError::from)?;
            for fired in abandoned.iter().filter(|f| f.requests_recovery) {
                let recovery_key = TriggerKey::new(fired.trigger_key.instance_name.clone(), fired.trigger_key.group.clone(), format!("recovery-{}-{}", fired.trigger_key.name, Uuid::new_v4()));
                let recovery = Trigger {
                    key: recovery_key,
                    job_key: fired.job_key.clone(),
                    description: Some(format!("recovery of {}", fired.trigger_key)),
                    next_fire_time: Some(fired.scheduled_fire_time),
                    previous_fire_time: None,
                    priority: fired.priority,
                    start_time: fired.scheduled_fire_time,
                    end_time: None,
                    calendar_name: None,
                    misfire_instruction: MisfireInstruction::IGNORE,
                    data: HashMap::new(),
                    state: TriggerState::Waiting,
                    recurrence: RecurrenceRule::Simple(SimpleTrigger {
                        start_time: fired.scheduled_fire_time,
                        end_time: None,
                        repeat_interval: chrono::Duration::zero(),
                        repeat_count: Some(0),
                        times_triggered: 0,
                    }),
                };
                self.repos.triggers.store(&recovery, cancel).await.map_err(schedstore_engine::EngineError::from)?;
            }

            self.repos.fired.remove_by_instance(instance_name, &self.config.instance_id, cancel).await.map_err(schedstore_engine::EngineError::from)?;
            self.repos.triggers.remove_by_state(instance_name, TriggerState::Complete, cancel).await.map_err(schedstore_engine::EngineError::from)?;
            Ok(())
        }
        .await;

        let release_token = CancellationToken::new();
        if let Err(err) = guard.release(&release_token).await {
            warn!(?err, "failed to release TriggerAccess after startup recovery");
        }
        result?;

        self.fire
            .run_misfire_sweep(instance_name, self.config.misfire_threshold, self.config.max_misfires_per_pass, true, cancel)
            .await
            .map_err(LifecycleError::from)?;
        Ok(())
    }

    fn spawn_sweeper(&mut self) {
        if self.sweeper.is_some() {
            return;
        }
        let shutdown = CancellationToken::new();
        let fire = self.fire.clone();
        let instance_name = self.config.instance_name.clone();
        let misfire_threshold = self.config.misfire_threshold;
        let db_retry_interval = self.config.db_retry_interval;
        let max_misfires_per_pass = self.config.max_misfires_per_pass;
        let log_threshold = self.config.retryable_action_error_log_threshold.max(1);
        let worker_shutdown = shutdown.clone();

        let join = tokio::spawn(async move {
            let mut consecutive_failures: u32 = 0;
            loop {
                if worker_shutdown.is_cancelled() {
                    break;
                }
                let started_at = Utc::now();
                let sweep = fire.run_misfire_sweep(instance_name.as_str(), misfire_threshold, max_misfires_per_pass, false, &worker_shutdown).await;

                let sleep_for = match sweep {
                    Ok(outcome) => {
                        consecutive_failures = 0;
                        if outcome.has_more_misfired_triggers {
                            SWEEPER_SLEEP_FLOOR
                        } else {
                            let elapsed = Utc::now() - started_at;
                            (misfire_threshold - elapsed).max(chrono::Duration::milliseconds(50)).to_std().unwrap_or(SWEEPER_SLEEP_FLOOR)
                        }
                    }
                    Err(err) => {
                        consecutive_failures += 1;
                        if consecutive_failures % log_threshold == 0 {
                            warn!(%err, consecutive_failures, "misfire sweep failed");
                        } else {
                            debug!(%err, consecutive_failures, "misfire sweep failed");
                        }
                        db_retry_interval.max(chrono::Duration::milliseconds(50)).to_std().unwrap_or(StdDuration::from_secs(15))
                    }
                };

                tokio::select! {
                    _ = tokio::time::sleep(sleep_for) => {}
                    _ = worker_shutdown.cancelled() => break,
                }
            }
        });

        self.sweeper = Some(Sweeper { shutdown, join });
    }

    /// `SchedulerPaused` (spec §4.7).
    pub async fn scheduler_paused(&self, cancel: &CancellationToken) -> Result<(), LifecycleError> {
        self.set_registration_state(SchedulerRegistrationState::Paused, cancel).await
    }

    /// `SchedulerResumed` (spec §4.7).
    pub async fn scheduler_resumed(&self, cancel: &CancellationToken) -> Result<(), LifecycleError> {
        self.set_registration_state(SchedulerRegistrationState::Resumed, cancel).await
    }

    async fn set_registration_state(&self, state: SchedulerRegistrationState, cancel: &CancellationToken) -> Result<(), LifecycleError> {
        let mut registration = self
            .repos
            .schedulers
            .get(self.config.instance_name.as_str(), &self.config.instance_id, cancel)
            .await
            .map_err(schedstore_engine::EngineError::from)?
            .ok_or_else(|| LifecycleError::Config("scheduler registration missing, was SchedulerStarted called?".to_string()))?;
        registration.state = state;
        registration.last_check_in = Utc::now();
        self.repos.schedulers.upsert(&registration, cancel).await.map_err(schedstore_engine::EngineError::from)?;
        Ok(())
    }

    /// `ClearAllSchedulingData` (spec §4.7).
    pub async fn clear_all_scheduling_data(&self, cancel: &CancellationToken) -> Result<(), LifecycleError> {
        self.storage.clear_all(self.config.instance_name.as_str(), cancel).await?;
        Ok(())
    }

    /// `Shutdown` (spec §4.7): stops the sweeper, waits for it to join, then
    /// deregisters this instance. Never touches other instances' rows.
    pub async fn shutdown(&mut self, cancel: &CancellationToken) -> Result<(), LifecycleError> {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.shutdown.cancel();
            if let Err(err) = sweeper.join.await {
                warn!(?err, "sweeper task panicked while shutting down");
            }
        }
        self.repos
            .schedulers
            .remove(self.config.instance_name.as_str(), &self.config.instance_id, cancel)
            .await
            .map_err(schedstore_engine::EngineError::from)?;
        info!(instance_name = %self.config.instance_name, instance_id = %self.config.instance_id, "scheduler shut down");
        Ok(())
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
