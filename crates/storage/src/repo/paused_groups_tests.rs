use super::*;
use crate::collections::CollectionNames;
use crate::testing::MemoryBackend;

fn ctx() -> Arc<StorageContext> {
    StorageContext::new(Arc::new(MemoryBackend::new()), CollectionNames::new("test_"))
}

fn cancel() -> CancellationToken {
    CancellationToken::new()
}

#[tokio::test]
async fn mark_paused_then_resumed_round_trips() {
    let repo = PausedGroupRepository::new(ctx());
    assert!(!repo.is_paused("test-instance", "billing", &cancel()).await.unwrap());

    repo.mark_paused("test-instance", "billing", &cancel()).await.unwrap();
    assert!(repo.is_paused("test-instance", "billing", &cancel()).await.unwrap());

    repo.mark_resumed("test-instance", "billing", &cancel()).await.unwrap();
    assert!(!repo.is_paused("test-instance", "billing", &cancel()).await.unwrap());
}

#[tokio::test]
async fn all_groups_sentinel_covers_every_group() {
    let repo = PausedGroupRepository::new(ctx());
    repo.mark_paused("test-instance", ALL_GROUPS_PAUSED, &cancel()).await.unwrap();
    assert!(repo.is_paused("test-instance", "anything", &cancel()).await.unwrap());
}

#[tokio::test]
async fn list_returns_sorted_group_names() {
    let repo = PausedGroupRepository::new(ctx());
    repo.mark_paused("test-instance", "z", &cancel()).await.unwrap();
    repo.mark_paused("test-instance", "a", &cancel()).await.unwrap();

    assert_eq!(repo.list("test-instance", &cancel()).await.unwrap(), vec!["a".to_string(), "z".to_string()]);
}
