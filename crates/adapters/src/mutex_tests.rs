use super::*;
use schedstore_storage::testing::MemoryBackend;

fn cancel() -> CancellationToken {
    CancellationToken::new()
}

fn mutex(owner: &str) -> DistributedMutex {
    DistributedMutex::new(
        Arc::new(MemoryBackend::new()),
        "test_locks",
        InstanceName::from("test-instance"),
        InstanceId::from(owner),
    )
}

#[tokio::test]
async fn acquire_then_release_round_trips() {
    let m = mutex("node-a");
    assert!(!m.is_held(LockType::TriggerAccess, &cancel()).await.unwrap());

    let guard = m.acquire(LockType::TriggerAccess, &cancel()).await.unwrap();
    assert!(m.is_held(LockType::TriggerAccess, &cancel()).await.unwrap());

    guard.release(&cancel()).await.unwrap();
    assert!(!m.is_held(LockType::TriggerAccess, &cancel()).await.unwrap());
}

#[tokio::test]
async fn release_is_a_no_op_when_already_gone() {
    let m = mutex("node-a");
    let guard = m.acquire(LockType::TriggerAccess, &cancel()).await.unwrap();
    guard.release(&cancel()).await.unwrap();

    // A second release attempt (e.g. after a TTL reap already cleared it)
    // must not error.
    m.release(LockType::TriggerAccess, &cancel()).await.unwrap();
}

#[tokio::test]
async fn release_rejects_a_non_owner() {
    let backend = Arc::new(MemoryBackend::new());
    let a = DistributedMutex::new(backend.clone(), "test_locks", InstanceName::from("test-instance"), InstanceId::from("node-a"));
    let b = DistributedMutex::new(backend, "test_locks", InstanceName::from("test-instance"), InstanceId::from("node-b"));

    let _guard = a.acquire(LockType::TriggerAccess, &cancel()).await.unwrap();
    let err = b.release(LockType::TriggerAccess, &cancel()).await.unwrap_err();
    assert!(matches!(err, MutexError::NotOwner { .. }));
}

#[tokio::test]
async fn expired_lock_can_be_reclaimed_by_another_owner() {
    let backend = Arc::new(MemoryBackend::new());
    let a = DistributedMutex::new(backend.clone(), "test_locks", InstanceName::from("test-instance"), InstanceId::from("node-a"))
        .with_ttl(Duration::milliseconds(-1));
    let b = DistributedMutex::new(backend, "test_locks", InstanceName::from("test-instance"), InstanceId::from("node-b"));

    let _guard = a.acquire(LockType::TriggerAccess, &cancel()).await.unwrap();
    // a's lock already expired (negative TTL); b must be able to claim it
    // without waiting out the poll loop.
    assert!(b.try_acquire_once(LockType::TriggerAccess, &cancel()).await.unwrap());
}

#[tokio::test]
async fn cancellation_aborts_a_contended_acquire() {
    let backend = Arc::new(MemoryBackend::new());
    let a = DistributedMutex::new(backend.clone(), "test_locks", InstanceName::from("test-instance"), InstanceId::from("node-a"));
    let b = DistributedMutex::new(backend, "test_locks", InstanceName::from("test-instance"), InstanceId::from("node-b"));

    let _guard = a.acquire(LockType::TriggerAccess, &cancel()).await.unwrap();
    let token = CancellationToken::new();
    token.cancel();
    let err = b.acquire(LockType::TriggerAccess, &token).await.unwrap_err();
    assert!(matches!(err, MutexError::Cancelled));
}

#[tokio::test]
async fn state_access_and_trigger_access_are_independent_locks() {
    let m = mutex("node-a");
    let _trigger_guard = m.acquire(LockType::TriggerAccess, &cancel()).await.unwrap();
    let _state_guard = m.acquire(LockType::StateAccess, &cancel()).await.unwrap();
    assert!(m.is_held(LockType::TriggerAccess, &cancel()).await.unwrap());
    assert!(m.is_held(LockType::StateAccess, &cancel()).await.unwrap());
}
