use super::*;
use crate::collections::CollectionNames;
use crate::testing::MemoryBackend;
use schedstore_core::{JobKey, TriggerBuilder};

fn ctx() -> Arc<StorageContext> {
    StorageContext::new(Arc::new(MemoryBackend::new()), CollectionNames::new("test_"))
}

fn cancel() -> CancellationToken {
    CancellationToken::new()
}

fn trigger_at(group: &str, name: &str, next_fire_time: DateTime<Utc>) -> Trigger {
    TriggerBuilder::default()
        .key(TriggerKey::new("test-instance", group, name))
        .job_key(JobKey::new("test-instance", "default", "job-1"))
        .next_fire_time(next_fire_time)
        .build()
}

#[tokio::test]
async fn store_then_get_round_trips() {
    let repo = TriggerRepository::new(ctx());
    let trigger = trigger_at("default", "t1", Utc::now());
    repo.store(&trigger, &cancel()).await.unwrap();

    let found = repo.get(&trigger.key, &cancel()).await.unwrap().unwrap();
    assert_eq!(found.key, trigger.key);
    assert_eq!(found.state, TriggerState::Waiting);
}

#[tokio::test]
async fn remove_deletes_and_reports_whether_present() {
    let repo = TriggerRepository::new(ctx());
    let trigger = trigger_at("default", "t1", Utc::now());
    repo.store(&trigger, &cancel()).await.unwrap();

    assert!(repo.remove(&trigger.key, &cancel()).await.unwrap());
    assert!(!repo.remove(&trigger.key, &cancel()).await.unwrap());
}

#[tokio::test]
async fn cas_state_fails_when_expected_state_does_not_match() {
    let repo = TriggerRepository::new(ctx());
    let trigger = trigger_at("default", "t1", Utc::now());
    repo.store(&trigger, &cancel()).await.unwrap();

    let won = repo.cas_state(&trigger.key, TriggerState::Acquired, TriggerState::Executing, &cancel()).await.unwrap();
    assert!(!won);

    let won = repo.cas_state(&trigger.key, TriggerState::Waiting, TriggerState::Acquired, &cancel()).await.unwrap();
    assert!(won);
    let found = repo.get(&trigger.key, &cancel()).await.unwrap().unwrap();
    assert_eq!(found.state, TriggerState::Acquired);
}

#[tokio::test]
async fn bulk_cas_state_scoped_to_group_only_touches_matching_rows() {
    let repo = TriggerRepository::new(ctx());
    let billing = trigger_at("billing", "t1", Utc::now());
    let reporting = trigger_at("reporting", "t1", Utc::now());
    repo.store(&billing, &cancel()).await.unwrap();
    repo.store(&reporting, &cancel()).await.unwrap();

    let matcher = schedstore_core::GroupMatcher::Equals("billing".into());
    let modified = repo
        .bulk_cas_state("test-instance", Some(&matcher), &[TriggerState::Waiting], TriggerState::Paused, &cancel())
        .await
        .unwrap();
    assert_eq!(modified, 1);

    assert_eq!(repo.get(&billing.key, &cancel()).await.unwrap().unwrap().state, TriggerState::Paused);
    assert_eq!(repo.get(&reporting.key, &cancel()).await.unwrap().unwrap().state, TriggerState::Waiting);
}

#[tokio::test]
async fn bulk_cas_state_with_no_matcher_scopes_to_whole_instance() {
    let repo = TriggerRepository::new(ctx());
    repo.store(&trigger_at("a", "t1", Utc::now()), &cancel()).await.unwrap();
    repo.store(&trigger_at("b", "t1", Utc::now()), &cancel()).await.unwrap();

    let modified =
        repo.bulk_cas_state("test-instance", None, &[TriggerState::Waiting], TriggerState::Acquired, &cancel()).await.unwrap();
    assert_eq!(modified, 2);
}

#[tokio::test]
async fn acquire_candidates_orders_by_next_fire_time_then_priority() {
    let repo = TriggerRepository::new(ctx());
    let now = Utc::now();
    let soon = trigger_at("default", "soon", now + chrono::Duration::seconds(1));
    let later = trigger_at("default", "later", now + chrono::Duration::seconds(30));
    repo.store(&soon, &cancel()).await.unwrap();
    repo.store(&later, &cancel()).await.unwrap();

    let keys = repo
        .acquire_candidates(
            "test-instance",
            now,
            now + chrono::Duration::seconds(5),
            chrono::Duration::seconds(0),
            chrono::Duration::seconds(0),
            10,
            &cancel(),
        )
        .await
        .unwrap();
    assert_eq!(keys, vec![soon.key]);
}

#[tokio::test]
async fn acquire_candidates_excludes_non_waiting_states() {
    let repo = TriggerRepository::new(ctx());
    let now = Utc::now();
    let mut acquired = trigger_at("default", "already-acquired", now);
    acquired.state = TriggerState::Acquired;
    repo.store(&acquired, &cancel()).await.unwrap();

    let keys = repo
        .acquire_candidates(
            "test-instance",
            now,
            now + chrono::Duration::seconds(5),
            chrono::Duration::seconds(0),
            chrono::Duration::seconds(0),
            10,
            &cancel(),
        )
        .await
        .unwrap();
    assert!(keys.is_empty());
}

#[tokio::test]
async fn misfire_candidates_only_returns_triggers_older_than_floor_and_not_ignoring() {
    let repo = TriggerRepository::new(ctx());
    let now = Utc::now();
    let stale = trigger_at("default", "stale", now - chrono::Duration::minutes(10));
    let mut ignoring = trigger_at("default", "ignoring", now - chrono::Duration::minutes(10));
    ignoring.misfire_instruction = schedstore_core::MisfireInstruction::IGNORE;
    let fresh = trigger_at("default", "fresh", now);
    repo.store(&stale, &cancel()).await.unwrap();
    repo.store(&ignoring, &cancel()).await.unwrap();
    repo.store(&fresh, &cancel()).await.unwrap();

    let floor = now - chrono::Duration::minutes(1);
    let candidates = repo.misfire_candidates("test-instance", floor, 100, &cancel()).await.unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].key, stale.key);

    assert_eq!(repo.count_misfired("test-instance", floor, &cancel()).await.unwrap(), 1);
}

#[tokio::test]
async fn cas_state_with_fire_times_updates_bookkeeping_atomically() {
    let repo = TriggerRepository::new(ctx());
    let trigger = trigger_at("default", "t1", Utc::now());
    repo.store(&trigger, &cancel()).await.unwrap();

    let next = Utc::now() + chrono::Duration::minutes(1);
    let won = repo
        .cas_state_with_fire_times(&trigger.key, TriggerState::Waiting, TriggerState::Waiting, Some(next), trigger.next_fire_time, &cancel())
        .await
        .unwrap();
    assert!(won);
    let found = repo.get(&trigger.key, &cancel()).await.unwrap().unwrap();
    assert_eq!(found.next_fire_time.unwrap().timestamp_millis(), next.timestamp_millis());
}

#[tokio::test]
async fn list_by_job_returns_all_triggers_of_a_job() {
    let repo = TriggerRepository::new(ctx());
    let job_key = JobKey::new("test-instance", "default", "shared-job");
    let t1 = TriggerBuilder::default().key(TriggerKey::new("test-instance", "default", "t1")).job_key(job_key.clone()).build();
    let t2 = TriggerBuilder::default().key(TriggerKey::new("test-instance", "default", "t2")).job_key(job_key.clone()).build();
    repo.store(&t1, &cancel()).await.unwrap();
    repo.store(&t2, &cancel()).await.unwrap();

    let found = repo.list_by_job(&job_key, &cancel()).await.unwrap();
    assert_eq!(found.len(), 2);
}

#[tokio::test]
async fn remove_by_state_only_deletes_matching_rows() {
    let repo = TriggerRepository::new(ctx());
    let mut done = trigger_at("default", "done", Utc::now());
    done.state = TriggerState::Complete;
    let waiting = trigger_at("default", "still-waiting", Utc::now());
    repo.store(&done, &cancel()).await.unwrap();
    repo.store(&waiting, &cancel()).await.unwrap();

    let removed = repo.remove_by_state("test-instance", TriggerState::Complete, &cancel()).await.unwrap();
    assert_eq!(removed, 1);
    assert!(repo.get(&done.key, &cancel()).await.unwrap().is_none());
    assert!(repo.get(&waiting.key, &cancel()).await.unwrap().is_some());
}
