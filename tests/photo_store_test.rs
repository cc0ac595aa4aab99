//! Photo store tests against a real temporary directory

mod helpers;

use std::fs::{File, FileTimes};
use std::path::Path;
use std::time::{Duration, SystemTime};

use helpers::*;
use s5_audit::services::{PhotoKind, PhotoStore, PHOTO_ROOT_DIR};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

fn backdate(path: &Path, age: Duration) {
    let when = SystemTime::now() - age;
    let file = File::options().write(true).open(path).expect("Failed to open photo");
    file.set_times(FileTimes::new().set_modified(when).set_accessed(when))
        .expect("Failed to set modification time");
}

#[tokio::test]
async fn test_saved_photo_lives_under_kind_folder() {
    init_test_logging();
    let root = tempfile::tempdir().unwrap();
    let source = write_test_photo(root.path(), "picked.png");
    let store = PhotoStore::with_root(root.path().join("app"), 30);

    let saved = store
        .save_problem_photo(&source, "auditor-1")
        .await
        .expect("Photo should be saved");

    assert!(saved.starts_with(root.path().join("app").join(PHOTO_ROOT_DIR).join("problems")));
    let file_name = saved.file_name().unwrap().to_string_lossy().into_owned();
    assert!(file_name.starts_with("auditor-1_"));
    assert!(file_name.ends_with(".jpg"));
    assert!(store.photo_exists(&saved).await);
    assert_eq!(
        store.load_photo(&saved).await.unwrap(),
        std::fs::read(&source).unwrap()
    );
}

#[tokio::test]
async fn test_missing_source_yields_none() {
    let root = tempfile::tempdir().unwrap();
    let store = PhotoStore::with_root(root.path(), 30);

    assert!(store
        .save_solution_photo(&root.path().join("nope.jpg"), "operator-1")
        .await
        .is_none());
    assert_eq!(store.get_total_photo_count().await, 0);
}

#[tokio::test]
async fn test_delete_reports_outcome() {
    let root = tempfile::tempdir().unwrap();
    let source = write_test_photo(root.path(), "picked.png");
    let store = PhotoStore::with_root(root.path(), 30);

    let saved = store.save_solution_photo(&source, "operator-1").await.unwrap();
    assert!(store.delete_photo(&saved).await);
    assert!(!store.photo_exists(&saved).await);
    assert!(!store.delete_photo(&saved).await);
}

#[tokio::test]
async fn test_counts_and_size_span_both_folders() {
    let root = tempfile::tempdir().unwrap();
    let source = write_test_photo(root.path(), "picked.png");
    let source_len = std::fs::metadata(&source).unwrap().len();
    let store = PhotoStore::with_root(root.path(), 30);

    store.save_problem_photo(&source, "auditor-1").await.unwrap();
    store.save_problem_photo(&source, "auditor-1").await.unwrap();
    store.save_solution_photo(&source, "operator-1").await.unwrap();

    assert_eq!(store.get_total_photo_count().await, 3);
    let expected_mb = (source_len * 3) as f64 / (1024.0 * 1024.0);
    assert!((store.get_total_photo_size().await - expected_mb).abs() < 1e-9);
}

#[tokio::test]
async fn test_retention_sweep_removes_only_expired_photos() {
    let root = tempfile::tempdir().unwrap();
    let source = write_test_photo(root.path(), "picked.png");
    let store = PhotoStore::with_root(root.path(), 30);

    let expired = store.save_problem_photo(&source, "auditor-1").await.unwrap();
    let recent = store.save_solution_photo(&source, "operator-1").await.unwrap();
    backdate(&expired, DAY * 31);
    backdate(&recent, DAY);

    assert_eq!(store.clean_old_photos().await, 1);
    assert!(!store.photo_exists(&expired).await);
    assert!(store.photo_exists(&recent).await);
    assert_eq!(store.get_total_photo_count().await, 1);
}

#[tokio::test]
async fn test_reader_source() {
    let root = tempfile::tempdir().unwrap();
    let store = PhotoStore::with_root(root.path(), 30);
    let bytes: &[u8] = b"not really a jpeg";

    let saved = store
        .save_from_reader(PhotoKind::Solution, bytes, "operator/1")
        .await
        .unwrap();

    assert!(saved.starts_with(store.directory_for(PhotoKind::Solution)));
    assert!(saved
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("operator_1_"));
    assert_eq!(store.load_photo(&saved).await.unwrap(), bytes);
}
