//! Integration tests for the durable resource store on disk

use super::support::{Fault, FlakyBackend};
use folio::error::{RestoreOutcome, StoreError};
use folio::store::ResourceStore;
use std::sync::Arc;
use tempfile::TempDir;

fn flaky_store() -> (TempDir, Arc<FlakyBackend>, ResourceStore) {
    let temp_dir = TempDir::new().unwrap();
    let backend = Arc::new(FlakyBackend::new(temp_dir.path()));
    let store = ResourceStore::new(backend.clone());
    (temp_dir, backend, store)
}

#[tokio::test]
async fn test_torn_write_restores_previous_content() {
    let (temp_dir, backend, store) = flaky_store();
    store.write("data/c-1.json", b"{\"data\":{}}").await.unwrap();

    backend.tear_on_failure(true);
    backend.fail_next(Fault::Write, "data/c-1.json");
    let err = store.write("data/c-1.json", b"{\"data\":{\"x\":1}}").await.unwrap_err();

    match err {
        StoreError::WriteFailure(failure) => {
            assert_eq!(failure.restore, RestoreOutcome::Restored);
            assert_eq!(failure.attempted, b"{\"data\":{\"x\":1}}".to_vec());
        }
        other => panic!("expected write failure, got {:?}", other),
    }
    assert_eq!(store.read("data/c-1.json").await.unwrap(), b"{\"data\":{}}".to_vec());
    assert_eq!(
        std::fs::read(temp_dir.path().join("data/c-1.json")).unwrap(),
        b"{\"data\":{}}".to_vec()
    );
}

#[tokio::test]
async fn test_failed_first_write_clears_partial_file() {
    let (temp_dir, backend, store) = flaky_store();
    backend.tear_on_failure(true);
    backend.fail_next(Fault::Write, "web-schema.json");

    let err = store.write("web-schema.json", b"[1,2,3,4]").await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::WriteFailure(ref f) if f.restore == RestoreOutcome::Cleared
    ));
    assert!(!temp_dir.path().join("web-schema.json").exists());
    assert!(matches!(
        store.read("web-schema.json").await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_failed_restore_is_reported() {
    let (_temp_dir, backend, store) = flaky_store();
    store.write("web-schema.json", b"[]").await.unwrap();

    // both the write and the restoring write fail
    backend.fail_next(Fault::Write, "web-schema.json");
    backend.fail_next(Fault::Write, "web-schema.json");
    let err = store.write("web-schema.json", b"[{}]").await.unwrap_err();

    match err {
        StoreError::WriteFailure(failure) => assert!(failure.restore.is_failed()),
        other => panic!("expected write failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_names_must_stay_inside_the_root() {
    let (_temp_dir, _backend, store) = flaky_store();
    for name in ["../outside.json", "/etc/passwd", "", "data/../../x"] {
        assert!(
            matches!(store.write(name, b"x").await, Err(StoreError::InvalidName(_))),
            "{:?}",
            name
        );
    }
}
