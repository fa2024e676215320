// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end scenarios and cross-cutting invariants exercised against the
//! whole stack (core -> storage -> adapters -> engine -> daemon), mirroring
//! the workspace's own `oj-specs` root package: one test per named scenario
//! or property, built on `MemoryBackend` rather than a live deployment.

use schedstore_adapters::{DistributedMutex, MemoryBackend};
use schedstore_core::test_support::{fresh_job_key, fresh_trigger_key, one_shot_recurrence, repeating_recurrence};
use schedstore_core::{
    CompletionInstruction, FakeClock, GroupMatcher, InstanceId, InstanceName, Job, LockType, Trigger, TriggerState, ALL_GROUPS_PAUSED,
};
use schedstore_daemon::{Config, Coordinator};
use schedstore_engine::{EngineError, FireManager, Repos, StorageManager};
use schedstore_storage::{CollectionNames, StorageContext, StoreBackend};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio_util::sync::CancellationToken;

fn cancel() -> CancellationToken {
    CancellationToken::new()
}

fn durable_job(group: &str) -> Job {
    Job::builder().key(fresh_job_key(group)).durable(true).build()
}

/// A storage manager and fire manager sharing one in-memory backend, the
/// harness every engine-level scenario below is built on.
struct Harness {
    repos: Arc<Repos>,
    storage: StorageManager,
    fire: FireManager<FakeClock>,
}

fn harness(clock: FakeClock) -> Harness {
    let backend: Arc<MemoryBackend> = Arc::new(MemoryBackend::new());
    let ctx = StorageContext::new(backend.clone(), CollectionNames::default());
    let repos = Arc::new(Repos::new(ctx));
    let mutex = Arc::new(DistributedMutex::new(backend, "test_locks", InstanceName::from("test-instance"), InstanceId::from("node-a")));
    let storage = StorageManager::new(repos.clone(), mutex.clone());
    let fire = FireManager::new(repos.clone(), mutex, clock, InstanceId::from("node-a"));
    Harness { repos, storage, fire }
}

fn daemon_config() -> Config {
    Config {
        connection_string: "mongodb://localhost/specs_db".to_string(),
        collection_prefix: "specs".to_string(),
        use_tls: false,
        instance_id: InstanceId::from("node-a"),
        instance_name: InstanceName::from("specs-instance"),
        misfire_threshold: chrono::Duration::seconds(60),
        db_retry_interval: chrono::Duration::seconds(15),
        max_misfires_per_pass: 20,
        retryable_action_error_log_threshold: 4,
    }
}

// ---- S1 — store and fire once --------------------------------------------

#[tokio::test]
async fn s1_store_and_fire_once() {
    let clock = FakeClock::new();
    let h = harness(clock.clone());
    let t0 = clock.now_utc();

    let job = durable_job("g1");
    h.storage.store_job(&job, false, &cancel()).await.unwrap();

    let trigger = Trigger::builder().key(fresh_trigger_key("g1")).job_key(job.key.clone()).next_fire_time(t0).recurrence(one_shot_recurrence(t0)).build();
    h.storage.store_trigger(&trigger, false, &cancel()).await.unwrap();

    clock.advance(chrono::Duration::milliseconds(10));
    let acquired = h.fire.acquire_next_triggers("test-instance", t0, 1, chrono::Duration::zero(), chrono::Duration::seconds(60), &cancel()).await.unwrap();
    assert_eq!(acquired, vec![{ let mut t = trigger.clone(); t.state = TriggerState::Acquired; t }]);

    let bundles = h.fire.triggers_fired(&[trigger.key.clone()], &cancel()).await.unwrap();
    assert_eq!(bundles.len(), 1);
    assert!(bundles[0].is_ok());

    h.fire.triggered_job_complete(&trigger.key, CompletionInstruction::SetComplete, None, &cancel()).await.unwrap();

    let stored = h.storage.get_trigger(&trigger.key, &cancel()).await.unwrap().unwrap();
    assert_eq!(stored.state, TriggerState::Complete);
}

// ---- S2 — two instances contending for one trigger ------------------------

#[tokio::test]
async fn s2_two_instances_contend_for_one_trigger() {
    let clock = FakeClock::new();
    let backend: Arc<MemoryBackend> = Arc::new(MemoryBackend::new());
    let ctx = StorageContext::new(backend.clone(), CollectionNames::default());
    let repos = Arc::new(Repos::new(ctx));
    let instance_name = InstanceName::from("test-instance");
    let mutex_a = Arc::new(DistributedMutex::new(backend.clone(), "test_locks", instance_name.clone(), InstanceId::from("node-a")));
    let mutex_b = Arc::new(DistributedMutex::new(backend, "test_locks", instance_name, InstanceId::from("node-b")));
    let fire_a = FireManager::new(repos.clone(), mutex_a, clock.clone(), InstanceId::from("node-a"));
    let fire_b = FireManager::new(repos.clone(), mutex_b, clock.clone(), InstanceId::from("node-b"));

    let job = durable_job("g1");
    repos.jobs.store(&job, false, &cancel()).await.unwrap();
    let t0 = clock.now_utc();
    let trigger = Trigger::builder().key(fresh_trigger_key("g1")).job_key(job.key.clone()).next_fire_time(t0).recurrence(one_shot_recurrence(t0)).build();
    repos.triggers.store(&trigger, &cancel()).await.unwrap();

    let window = chrono::Duration::zero();
    let threshold = chrono::Duration::seconds(60);
    let (a, b) = tokio::join!(
        fire_a.acquire_next_triggers("test-instance", t0, 1, window, threshold, &cancel()),
        fire_b.acquire_next_triggers("test-instance", t0, 1, window, threshold, &cancel()),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    // `with_trigger_access` serializes the two calls on the same lock, so
    // whichever wins the CAS returns the trigger and the other finds nothing
    // left in `Waiting` to acquire.
    assert_eq!(a.len() + b.len(), 1, "exactly one instance should acquire the trigger");
}

// ---- S3 — a crashed lock holder is reclaimed within one TTL period -------

#[tokio::test]
async fn s3_crashed_lock_holder_is_reclaimed_within_one_ttl() {
    let backend: Arc<dyn StoreBackend> = Arc::new(MemoryBackend::new());
    let ttl = chrono::Duration::milliseconds(50);
    let instance_name = InstanceName::from("cluster-a");
    let a = DistributedMutex::new(backend.clone(), "locks", instance_name.clone(), InstanceId::from("node-a")).with_ttl(ttl);
    let b = DistributedMutex::new(backend, "locks", instance_name, InstanceId::from("node-b")).with_ttl(ttl);

    let guard = a.acquire(LockType::TriggerAccess, &cancel()).await.unwrap();
    // node-a is SIGKILL-ed: the guard is leaked rather than released.
    std::mem::forget(guard);

    tokio::time::sleep(StdDuration::from_millis(ttl.num_milliseconds() as u64 + 30)).await;

    let acquired = tokio::time::timeout(StdDuration::from_secs(3), b.acquire(LockType::TriggerAccess, &cancel())).await;
    assert!(acquired.is_ok(), "node-b should reclaim the lock once the TTL elapses");
}

// ---- S4 — misfire sweep advances the next fire time and notifies once ---

#[tokio::test]
async fn s4_misfire_sweep_advances_trigger_and_notifies_once() {
    let clock = FakeClock::new();
    let h = harness(clock.clone());
    let now = clock.now_utc();
    let threshold = chrono::Duration::seconds(60);

    let job = durable_job("g1");
    h.storage.store_job(&job, false, &cancel()).await.unwrap();
    let stale_start = now - threshold * 5;
    let trigger = Trigger::builder()
        .key(fresh_trigger_key("g1"))
        .job_key(job.key.clone())
        .next_fire_time(stale_start)
        .recurrence(repeating_recurrence(stale_start, chrono::Duration::seconds(30)))
        .build();
    h.repos.triggers.store(&trigger, &cancel()).await.unwrap();

    let result = h.fire.run_misfire_sweep("test-instance", threshold, 10, false, &cancel()).await.unwrap();
    assert_eq!(result.handled, 1);

    let stored = h.storage.get_trigger(&trigger.key, &cancel()).await.unwrap().unwrap();
    assert_eq!(stored.state, TriggerState::Waiting);
    assert!(stored.next_fire_time.unwrap() > trigger.next_fire_time.unwrap(), "next_fire_time should have advanced past the original stale value");
}

// ---- S5 — startup recovery synthesizes a recovery trigger ----------------

#[tokio::test]
async fn s5_startup_recovery_synthesizes_a_recovery_trigger() {
    use schedstore_core::{FiredInstanceId, FiredTrigger};

    let backend: Arc<MemoryBackend> = Arc::new(MemoryBackend::new());
    let mut coordinator = Coordinator::new(backend, daemon_config()).await.unwrap();

    let job = durable_job("g1");
    coordinator.storage().store_job(&job, false, &cancel()).await.unwrap();
    let trigger_key = fresh_trigger_key("g1");
    let scheduled = chrono::Utc::now() - chrono::Duration::minutes(5);
    let fired = FiredTrigger {
        id: FiredInstanceId::new(&trigger_key, coordinator.config().instance_id.clone(), scheduled.timestamp_micros()),
        instance_id: coordinator.config().instance_id.clone(),
        trigger_key: trigger_key.clone(),
        job_key: job.key.clone(),
        fired_time: scheduled,
        scheduled_fire_time: scheduled,
        requests_recovery: true,
        concurrent_execution_disallowed: false,
        priority: 5,
    };
    coordinator.repos().fired.insert("specs-instance", &fired, &cancel()).await.unwrap();

    coordinator.scheduler_started(&cancel()).await.unwrap();

    let remaining = coordinator.repos().fired.list_by_instance("specs-instance", &coordinator.config().instance_id.clone(), &cancel()).await.unwrap();
    assert!(remaining.is_empty(), "the abandoned fired-trigger row should be gone after recovery");

    let keys = coordinator.storage().list_trigger_keys("specs-instance", &GroupMatcher::Anything, &cancel()).await.unwrap();
    let recovery_key = keys.iter().find(|k| k.name.starts_with("recovery-")).expect("a recovery trigger should have been synthesized");
    let recovery_trigger = coordinator.storage().get_trigger(recovery_key, &cancel()).await.unwrap().unwrap();
    assert_eq!(recovery_trigger.next_fire_time, Some(scheduled));

    coordinator.shutdown(&cancel()).await.unwrap();
}

// ---- S6 — pause-all / resume-all ------------------------------------------

#[tokio::test]
async fn s6_pause_all_then_resume_all() {
    let clock = FakeClock::new();
    let h = harness(clock.clone());
    let now = clock.now_utc();

    let job = durable_job("g1");
    h.storage.store_job(&job, false, &cancel()).await.unwrap();
    let t1 = Trigger::builder().key(fresh_trigger_key("g1")).job_key(job.key.clone()).next_fire_time(now).recurrence(repeating_recurrence(now, chrono::Duration::minutes(1))).build();
    let t2 = Trigger::builder().key(fresh_trigger_key("g2")).job_key(job.key.clone()).next_fire_time(now).recurrence(repeating_recurrence(now, chrono::Duration::minutes(1))).build();
    h.storage.store_trigger(&t1, false, &cancel()).await.unwrap();
    h.storage.store_trigger(&t2, false, &cancel()).await.unwrap();

    h.storage.pause_all("test-instance", &cancel()).await.unwrap();

    assert_eq!(h.storage.get_trigger(&t1.key, &cancel()).await.unwrap().unwrap().state, TriggerState::Paused);
    assert_eq!(h.storage.get_trigger(&t2.key, &cancel()).await.unwrap().unwrap().state, TriggerState::Paused);
    let paused_groups = h.repos.paused.list("test-instance", &cancel()).await.unwrap();
    assert!(paused_groups.iter().any(|g| g == ALL_GROUPS_PAUSED));

    // A trigger stored after `PauseAll` in a brand new group starts `Paused`.
    let t3 = Trigger::builder().key(fresh_trigger_key("g3")).job_key(job.key.clone()).next_fire_time(now).recurrence(repeating_recurrence(now, chrono::Duration::minutes(1))).build();
    h.storage.store_trigger(&t3, false, &cancel()).await.unwrap();
    assert_eq!(h.storage.get_trigger(&t3.key, &cancel()).await.unwrap().unwrap().state, TriggerState::Paused);

    h.storage.resume_all("test-instance", &cancel()).await.unwrap();

    for key in [&t1.key, &t2.key, &t3.key] {
        assert_eq!(h.storage.get_trigger(key, &cancel()).await.unwrap().unwrap().state, TriggerState::Waiting);
    }
    assert!(h.repos.paused.list("test-instance", &cancel()).await.unwrap().is_empty());
}

// ---- Property 3 — referential integrity -----------------------------------

#[tokio::test]
async fn property_store_trigger_with_missing_job_fails_with_integrity() {
    let clock = FakeClock::new();
    let h = harness(clock.clone());
    let now = clock.now_utc();

    let orphan_job_key = fresh_job_key("g1");
    let trigger = Trigger::builder().key(fresh_trigger_key("g1")).job_key(orphan_job_key).next_fire_time(now).recurrence(one_shot_recurrence(now)).build();

    let err = h.storage.store_trigger(&trigger, false, &cancel()).await.unwrap_err();
    assert!(matches!(err, EngineError::Integrity(_)));
}

#[tokio::test]
async fn property_remove_calendar_with_referencing_trigger_fails_with_integrity() {
    use schedstore_core::Calendar;

    let clock = FakeClock::new();
    let h = harness(clock.clone());
    let now = clock.now_utc();

    h.storage
        .store_calendar("test-instance", "biz-days", Calendar::Base, true, false, chrono::Duration::seconds(60), now, &cancel())
        .await
        .unwrap();

    let job = durable_job("g1");
    h.storage.store_job(&job, false, &cancel()).await.unwrap();
    let mut trigger = Trigger::builder().key(fresh_trigger_key("g1")).job_key(job.key.clone()).next_fire_time(now).recurrence(one_shot_recurrence(now)).build();
    trigger.calendar_name = Some("biz-days".to_string());
    h.storage.store_trigger(&trigger, false, &cancel()).await.unwrap();

    let err = h.storage.remove_calendar("test-instance", "biz-days", &cancel()).await.unwrap_err();
    assert!(matches!(err, EngineError::Integrity(_)));
}

// ---- Property 8 — misfire sweep is idempotent -----------------------------

#[tokio::test]
async fn property_misfire_sweep_is_idempotent() {
    let clock = FakeClock::new();
    let h = harness(clock.clone());
    let now = clock.now_utc();
    let threshold = chrono::Duration::seconds(60);

    let job = durable_job("g1");
    h.storage.store_job(&job, false, &cancel()).await.unwrap();
    let fire_time = now - threshold * 5;
    let trigger = Trigger::builder().key(fresh_trigger_key("g1")).job_key(job.key.clone()).next_fire_time(fire_time).recurrence(one_shot_recurrence(fire_time)).build();
    h.repos.triggers.store(&trigger, &cancel()).await.unwrap();

    let first = h.fire.run_misfire_sweep("test-instance", threshold, 10, false, &cancel()).await.unwrap();
    let after_first = h.storage.get_trigger(&trigger.key, &cancel()).await.unwrap().unwrap();

    let second = h.fire.run_misfire_sweep("test-instance", threshold, 10, false, &cancel()).await.unwrap();
    let after_second = h.storage.get_trigger(&trigger.key, &cancel()).await.unwrap().unwrap();

    assert_eq!(first.handled, 1);
    assert_eq!(second.handled, 0, "a one-shot trigger already finalized to Complete is no longer a misfire candidate");
    assert_eq!(after_first.state, after_second.state);
    assert_eq!(after_first.next_fire_time, after_second.next_fire_time);
}

// ---- Property 9 — UTC discipline ------------------------------------------

#[tokio::test]
async fn property_persisted_timestamps_round_trip_exactly() {
    let clock = FakeClock::new();
    let h = harness(clock.clone());
    let now = clock.now_utc();

    let job = durable_job("g1");
    h.storage.store_job(&job, false, &cancel()).await.unwrap();
    let trigger = Trigger::builder().key(fresh_trigger_key("g1")).job_key(job.key.clone()).next_fire_time(now).recurrence(one_shot_recurrence(now)).build();
    h.storage.store_trigger(&trigger, false, &cancel()).await.unwrap();

    let stored = h.storage.get_trigger(&trigger.key, &cancel()).await.unwrap().unwrap();
    assert_eq!(stored.next_fire_time, Some(now));
    assert_eq!(stored.next_fire_time.unwrap().timezone(), chrono::Utc);
}
