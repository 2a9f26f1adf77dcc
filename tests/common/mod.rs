//! Shared test utilities for the integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's
//! main.rs.

#![allow(dead_code)]

use snapquery::{ColumnSpec, Handle, Row, Snapshot, SnapshotCache};

/// A small people dataset: (name, age, city).
pub fn people_snapshot() -> Snapshot {
    Snapshot::new(
        vec![
            Row::new().with("name", "Ada").with("age", 36i64).with("city", "London"),
            Row::new().with("name", "Grace").with("age", 45i64).with("city", "Arlington"),
            Row::new().with("name", "Alan").with("age", 41i64).with("city", "London"),
            Row::new().with("name", "Edsger").with("age", 72i64).with("city", "Austin"),
            Row::new().with("name", "Barbara").with("age", 68i64).with("city", "Boston"),
        ],
        vec![
            ColumnSpec::new("name").with_type("string"),
            ColumnSpec::new("age").with_type("int"),
            ColumnSpec::new("city").with_type("string"),
        ],
    )
}

/// Acquire `snapshot` under `signature` and wait until it is ready.
pub async fn ready_handle(
    cache: &SnapshotCache,
    signature: &str,
    snapshot: Snapshot,
) -> Handle {
    let handle = cache.acquire(signature, move || async move { Ok(snapshot) });
    handle
        .entry()
        .expect("entry")
        .wait_ready()
        .await
        .expect("ready");
    handle
}

/// Acquire the people dataset, ready to query.
pub async fn people_handle(cache: &SnapshotCache, signature: &str) -> Handle {
    ready_handle(cache, signature, people_snapshot()).await
}
