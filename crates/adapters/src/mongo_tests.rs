use super::*;
use bson::doc;

/// These exercise the real driver against a live server and are excluded
/// from the default test run; `cargo test -- --ignored` with
/// `SCHEDSTORE_MONGO_TEST_URI` set against a disposable database runs them.
fn test_uri() -> Option<String> {
    std::env::var("SCHEDSTORE_MONGO_TEST_URI").ok()
}

async fn connect() -> MongoBackend {
    let uri = test_uri().expect("SCHEDSTORE_MONGO_TEST_URI must be set to run mongo-backed tests");
    MongoBackend::connect(&uri, "schedstore_test").await.expect("connect to test mongo instance")
}

fn cancel() -> CancellationToken {
    CancellationToken::new()
}

#[tokio::test]
#[ignore]
async fn insert_then_find_one_round_trips() {
    let backend = connect().await;
    let collection = "mongo_backend_smoke";
    backend.delete_many(collection, doc! {}, &cancel()).await.unwrap();

    backend.insert_one(collection, doc! { "k": "v" }, &cancel()).await.unwrap();
    let found = backend.find_one(collection, doc! { "k": "v" }, &cancel()).await.unwrap();
    assert!(found.is_some());
}

#[tokio::test]
#[ignore]
async fn replace_one_upsert_refuses_a_colliding_insert() {
    let backend = connect().await;
    let collection = "mongo_backend_lock_smoke";
    backend.delete_many(collection, doc! {}, &cancel()).await.unwrap();
    backend
        .ensure_indexes(collection, &[IndexSpec::new("pk", doc! { "k": 1 }).unique()])
        .await
        .unwrap();

    backend.insert_one(collection, doc! { "k": "lock", "expire_at": 999_999_999_999i64 }, &cancel()).await.unwrap();

    let outcome = backend
        .replace_one(collection, doc! { "k": "lock", "expire_at": { "$lt": 0i64 } }, doc! { "k": "lock", "expire_at": 1i64 }, true, &cancel())
        .await
        .unwrap();
    assert!(!outcome.cas_won());
}
