mod common;

use std::sync::Arc;
use std::time::Duration;

use biodata_maker::persistence::InMemoryRepository;
use biodata_maker::photo::encode_data_uri;
use biodata_maker::record::Record;
use biodata_maker::service::{BiodataService, ServiceError};
use biodata_maker::storage::LocalImageStorage;
use serde_json::json;
use tokio::net::TcpListener;

use common::{
    png, test_context, test_context_over, test_context_with, user, FlakyRepository,
    MockImageStorage,
};

fn record(value: serde_json::Value) -> Record {
    serde_json::from_value(value).unwrap()
}

#[tokio::test]
async fn test_local_only_mode_is_refused() {
    let ctx = test_context();
    let service = &ctx.state.service;

    assert!(matches!(
        service.save(None, Record::default()).await,
        Err(ServiceError::Unauthenticated)
    ));
    assert!(matches!(service.list(None).await, Err(ServiceError::Unauthenticated)));
}

#[tokio::test]
async fn test_updating_someone_elses_record_is_denied() {
    let ctx = test_context();
    let service = &ctx.state.service;
    let alice = user("alice");
    let bob = user("bob");

    let id = service.save(Some(&alice), Record::default()).await.unwrap();

    let mut stolen = service.get(Some(&alice), &id).await.unwrap();
    stolen.about_me = Some("hijacked".into());
    assert!(matches!(
        service.save(Some(&bob), stolen).await,
        Err(ServiceError::PermissionDenied(_))
    ));

    let kept = service.get(Some(&alice), &id).await.unwrap();
    assert!(kept.about_me.is_none());
}

#[tokio::test]
async fn test_list_is_newest_first_and_sees_updates() {
    let ctx = test_context();
    let service = &ctx.state.service;
    let owner = user("owner");

    let first = service
        .save(Some(&owner), record(json!({ "aboutMe": "first" })))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = service
        .save(Some(&owner), record(json!({ "aboutMe": "second" })))
        .await
        .unwrap();

    let ids: Vec<_> = service
        .list(Some(&owner))
        .await
        .unwrap()
        .into_iter()
        .filter_map(|r| r.id)
        .collect();
    assert_eq!(ids, [second.clone(), first.clone()]);

    // Touching the older record moves it to the front, past the cached list.
    tokio::time::sleep(Duration::from_millis(5)).await;
    let mut older = service.get(Some(&owner), &first).await.unwrap();
    older.about_me = Some("edited".into());
    service.save(Some(&owner), older).await.unwrap();

    let records = service.list(Some(&owner)).await.unwrap();
    assert_eq!(records[0].id.as_deref(), Some(first.as_str()));
    assert_eq!(records[0].about_me.as_deref(), Some("edited"));
    assert!(service.list(Some(&user("stranger"))).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_survives_photo_storage_failure() {
    let ctx = test_context_with(MockImageStorage::failing_deletes());
    let service = &ctx.state.service;
    let owner = user("owner");

    let id = service
        .save(
            Some(&owner),
            record(json!({ "photoUrl": "https://cdn.test/biodata-photos/x.jpg" })),
        )
        .await
        .unwrap();

    service.delete(Some(&owner), &id).await.unwrap();
    assert!(matches!(
        service.get(Some(&owner), &id).await,
        Err(ServiceError::Persistence(_))
    ));
}

#[tokio::test]
async fn test_new_photo_replaces_the_old_one() {
    let ctx = test_context();
    let service = &ctx.state.service;
    let owner = user("owner");
    let id = service.save(Some(&owner), Record::default()).await.unwrap();

    let first = service
        .attach_photo(Some(&owner), &id, "a.png", &png(30, 40))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(2)).await;
    let second = service
        .attach_photo(Some(&owner), &id, "b.png", &png(30, 40))
        .await
        .unwrap();

    assert_ne!(first, second);
    assert!(!ctx.images.has_url(&first).await);
    assert!(ctx.images.has_url(&second).await);
    assert_eq!(ctx.images.len().await, 1);

    let saved = service.get(Some(&owner), &id).await.unwrap();
    assert_eq!(saved.photo_url.as_deref(), Some(second.as_str()));
}

#[tokio::test]
async fn test_fetch_photo_sources() {
    let ctx = test_context();
    let service = &ctx.state.service;
    let bytes = png(8, 8);

    assert_eq!(
        service.fetch_photo(&encode_data_uri("image/png", &bytes)).await,
        Some(bytes.clone())
    );
    assert_eq!(service.fetch_photo("data:garbage").await, None);

    let folder = ctx.dir.path().join("images").join("biodata-photos");
    std::fs::create_dir_all(&folder).unwrap();
    std::fs::write(folder.join("me.png"), &bytes).unwrap();
    assert_eq!(
        service.fetch_photo("/images/biodata-photos/me.png").await,
        Some(bytes)
    );
    assert_eq!(service.fetch_photo("/images/biodata-photos/gone.png").await, None);
    assert_eq!(service.fetch_photo("/images/../secret").await, None);
}

#[tokio::test]
async fn test_failed_save_keeps_the_previous_photo() {
    let repository = Arc::new(FlakyRepository::new());
    let ctx = test_context_over(repository.clone(), MockImageStorage::new());
    let service = &ctx.state.service;
    let owner = user("owner");
    let id = service.save(Some(&owner), Record::default()).await.unwrap();

    let first = service
        .attach_photo(Some(&owner), &id, "a.png", &png(30, 40))
        .await
        .unwrap();

    repository.fail_saves(true);
    tokio::time::sleep(Duration::from_millis(2)).await;
    let result = service
        .attach_photo(Some(&owner), &id, "b.png", &png(30, 40))
        .await;
    assert!(matches!(result, Err(ServiceError::Persistence(_))));

    // The stored record and its photo are untouched; the new upload is gone.
    assert!(ctx.images.has_url(&first).await);
    assert_eq!(ctx.images.len().await, 1);
    let saved = service.get(Some(&owner), &id).await.unwrap();
    assert_eq!(saved.photo_url.as_deref(), Some(first.as_str()));
}

const BUCKET: &str = "https://proj.supabase.co/storage/v1/object/public/biodata/";

fn service_trusting_bucket(dir: &std::path::Path) -> BiodataService {
    BiodataService::new(
        Arc::new(InMemoryRepository::new()),
        Arc::new(MockImageStorage::new()),
        LocalImageStorage::new(dir),
        reqwest::Client::new(),
    )
    .trust_photos_under(BUCKET)
}

#[test]
fn test_remote_photos_only_from_trusted_storage() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_trusting_bucket(dir.path());

    assert!(service.accepts_remote_photo(&format!("{BUCKET}biodata-photos/a.jpg")));
    assert!(!service.accepts_remote_photo("http://169.254.169.254/latest/meta-data/"));
    assert!(!service.accepts_remote_photo(&format!("{BUCKET}../../../../auth/v1/admin/users")));
    assert!(!service.accepts_remote_photo(
        "https://proj.supabase.co.evil.test/storage/v1/object/public/biodata/a.jpg"
    ));
    assert!(!service.accepts_remote_photo("file:///etc/passwd"));
    assert!(!service.accepts_remote_photo("not a url"));
}

#[tokio::test]
async fn test_untrusted_photo_url_is_never_requested() {
    let ctx = test_context();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/internal/photo.png", listener.local_addr().unwrap());

    assert_eq!(ctx.state.service.fetch_photo(&url).await, None);

    let connection = tokio::time::timeout(Duration::from_millis(200), listener.accept()).await;
    assert!(connection.is_err(), "the export reached out to {}", url);
}
