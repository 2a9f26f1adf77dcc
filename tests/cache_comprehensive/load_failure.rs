//! Loader failure
//!
//! A loader that settles with an error fails every waiting and future
//! pipeline fast with `LoadFailed`; the entry itself stays registered and
//! refcounted until released.

use crate::common::people_snapshot;
use snapquery::{Error, HandleQueryExt, Signature, SnapshotCache};

#[tokio::test]
async fn pending_and_late_waiters_observe_failure() {
    let cache = SnapshotCache::new();
    let handle = cache.acquire("broken", || async { Err("backend timeout".to_string()) });

    // Waiter registered before the failure settles
    let entry = handle.entry().expect("entry");
    let early = tokio::spawn(async move { entry.wait_ready().await });
    let err = early.await.expect("join").expect_err("failed load");
    assert!(matches!(err, Error::LoadFailed(cause) if cause.contains("timeout")));

    // Pipeline built after the failure settles fails the same way
    let err = handle
        .query()
        .expect("entry still registered")
        .execute()
        .await
        .expect_err("failed load");
    assert!(matches!(err, Error::LoadFailed(_)));

    // Lifecycle is unaffected: the failed entry releases normally
    assert!(cache.contains(&Signature::from("broken")));
    handle.release().expect("release");
    assert!(cache.is_empty());
}

#[tokio::test]
async fn failure_does_not_leak_into_other_signatures() {
    let cache = SnapshotCache::new();
    let broken = cache.acquire("broken", || async { Err("boom".to_string()) });
    let healthy = cache.acquire("healthy", || async { Ok(people_snapshot()) });

    let cursor = healthy
        .query()
        .expect("pipeline")
        .execute()
        .await
        .expect("cursor");
    assert_eq!(cursor.count(), 5);

    assert!(broken
        .query()
        .expect("pipeline")
        .execute()
        .await
        .is_err());

    broken.release().expect("release");
    healthy.release().expect("release");
}

#[tokio::test]
async fn attaching_to_a_failed_entry_shares_the_failure() {
    let cache = SnapshotCache::new();
    let first = cache.acquire("broken", || async { Err("boom".to_string()) });
    first.entry().expect("entry").wait_ready().await.expect_err("failed");

    // Single-flight still holds: no reload for a failed-but-live entry
    let second = cache.acquire("broken", || async {
        panic!("loader must not run for an existing entry")
    });
    let err = second
        .query()
        .expect("pipeline")
        .execute()
        .await
        .expect_err("shared failure");
    assert!(matches!(err, Error::LoadFailed(cause) if cause == "boom"));

    first.release().expect("release");
    second.release().expect("release");
}
