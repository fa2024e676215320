use super::*;
use crate::collections::CollectionNames;
use crate::testing::MemoryBackend;
use std::collections::BTreeSet;

fn ctx() -> Arc<StorageContext> {
    StorageContext::new(Arc::new(MemoryBackend::new()), CollectionNames::new("test_"))
}

fn cancel() -> CancellationToken {
    CancellationToken::new()
}

#[tokio::test]
async fn store_then_get_round_trips() {
    let repo = CalendarRepository::new(ctx());
    let calendar = Calendar::Holiday { excluded_dates: BTreeSet::new() };
    repo.store("test-instance", "holidays", calendar.clone(), false, &cancel()).await.unwrap();

    let found = repo.get("test-instance", "holidays", &cancel()).await.unwrap().unwrap();
    assert_eq!(found, calendar);
}

#[tokio::test]
async fn store_without_replace_rejects_duplicate() {
    let repo = CalendarRepository::new(ctx());
    repo.store("test-instance", "holidays", Calendar::Base, false, &cancel()).await.unwrap();

    let err = repo.store("test-instance", "holidays", Calendar::Base, false, &cancel()).await.unwrap_err();
    assert!(matches!(err, RepoError::AlreadyExists));
}

#[tokio::test]
async fn remove_deletes_and_reports_whether_present() {
    let repo = CalendarRepository::new(ctx());
    repo.store("test-instance", "holidays", Calendar::Base, false, &cancel()).await.unwrap();

    assert!(repo.remove("test-instance", "holidays", &cancel()).await.unwrap());
    assert!(!repo.remove("test-instance", "holidays", &cancel()).await.unwrap());
}

#[tokio::test]
async fn list_names_is_sorted() {
    let repo = CalendarRepository::new(ctx());
    repo.store("test-instance", "z-cal", Calendar::Base, false, &cancel()).await.unwrap();
    repo.store("test-instance", "a-cal", Calendar::Base, false, &cancel()).await.unwrap();

    let names = repo.list_names("test-instance", &cancel()).await.unwrap();
    assert_eq!(names, vec!["a-cal".to_string(), "z-cal".to_string()]);
}
