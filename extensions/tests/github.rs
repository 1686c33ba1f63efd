use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use gitdocs_core::session::AlwaysConfirm;
use gitdocs_core::{ContentStore, IndexSynchronizer, PutRequest, SaveOutcome, StoreError, UploadForm, UploadSession};
use gitdocs_extensions::github::GitHubStore;
use tracing::info;

mod common;

// Helper to initialize tracing subscriber
fn setup_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}

fn unique_suffix() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or_default()
}

// Ignored by default to avoid writing to a real repository on every `cargo test`
// Run specifically with: `cargo test -- --ignored`
#[tokio::test]
#[ignore]
async fn missing_file_reads_as_none() {
    setup_tracing();
    let Some(config) = common::get_test_config("missing_file_reads_as_none") else { return };
    let store = GitHubStore::new(config.clone()).unwrap();

    let path = config.document_path(&format!("does not exist {}", unique_suffix()));
    let result = store.get(&path).await.unwrap();

    assert!(result.is_none());
}

#[tokio::test]
#[ignore]
async fn create_update_and_reject_stale_sha() {
    setup_tracing();
    let Some(config) = common::get_test_config("create_update_and_reject_stale_sha") else { return };
    let store = GitHubStore::new(config.clone()).unwrap();
    let path = config.document_path(&format!("file {}", unique_suffix()));

    let created = store.put(&path, PutRequest::new("create", b"one".to_vec(), None)).await.unwrap();
    info!(url = ?created.url, "Created test file");
    assert!(created.url.is_some());

    let read = store.get(&path).await.unwrap().expect("file should exist after create");
    assert_eq!(read.content, b"one");
    assert_eq!(read.version, created.version);

    let updated = store.put(&path, PutRequest::new("update", b"two".to_vec(), Some(created.version.clone()))).await.unwrap();
    assert_ne!(updated.version, created.version);

    let stale = store.put(&path, PutRequest::new("stale", b"three".to_vec(), Some(created.version))).await;
    assert!(stale.unwrap_err().is_conflict());

    let blind = store.put(&path, PutRequest::new("blind", b"three".to_vec(), None)).await;
    assert!(blind.unwrap_err().is_conflict());
}

#[tokio::test]
#[ignore]
async fn upload_session_round_trip() {
    setup_tracing();
    let Some(config) = common::get_test_config(&format!("session-{}", unique_suffix())) else { return };
    let store: Arc<dyn ContentStore> = Arc::new(GitHubStore::new(config.clone()).unwrap());
    let session = UploadSession::new(store.clone(), &config, Box::new(AlwaysConfirm));

    assert_eq!(session.load().await.unwrap(), 0);

    let form = UploadForm::new("report.txt", b"quarterly".to_vec()).with_title("Report v1");
    let outcome = session.save(form).await.unwrap();
    assert!(matches!(outcome, SaveOutcome::Saved { replaced: false, .. }));

    let form = UploadForm::new("report.txt", b"quarterly, revised".to_vec()).with_title("Report v1");
    let outcome = session.save(form).await.unwrap();
    assert!(matches!(outcome, SaveOutcome::Saved { replaced: true, .. }));

    let index = IndexSynchronizer::new(store, &config).fetch().await.unwrap();
    assert_eq!(index.len(), 1);
    assert!(index.get("Report v1").and_then(|doc| doc.url.as_ref()).is_some());
}

#[tokio::test]
#[ignore]
async fn large_file_is_read_back_through_raw_media_type() {
    setup_tracing();
    let Some(config) = common::get_test_config("large_file_is_read_back_through_raw_media_type") else { return };
    let store = GitHubStore::new(config.clone()).unwrap();
    let path = config.document_path(&format!("large {}", unique_suffix()));

    // Above the 1 MB limit for inlined content
    let content: Vec<u8> = (0..1_200_000u32).map(|i| (i % 251) as u8).collect();
    let created = store.put(&path, PutRequest::new("large file", content.clone(), None)).await.unwrap();

    let read = store.get(&path).await.unwrap().expect("large file should exist after create");
    assert_eq!(read.content.len(), content.len());
    assert!(read.content == content);
    assert_eq!(read.version, created.version);
}

#[tokio::test]
#[ignore]
async fn request_timeout_is_enforced() {
    setup_tracing();
    let Some(config) = common::get_test_config("request_timeout_is_enforced") else { return };
    let store = GitHubStore::new(config.clone().timeout(Duration::from_millis(1))).unwrap();

    let result = store.get(&config.index_path()).await;

    assert!(matches!(result, Err(StoreError::Timeout)), "unexpected result: {:?}", result.map(|o| o.is_some()));
}
