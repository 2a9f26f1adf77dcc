//! Ordering and pagination stages

use crate::common::{people_handle, ready_handle};
use proptest::prelude::*;
use snapquery::{ColumnSpec, HandleQueryExt, Row, Snapshot, SnapshotCache, Value};

fn scores() -> Snapshot {
    Snapshot::new(
        vec![
            Row::new().with("score", 1i64),
            Row::new().with("score", 3i64),
            Row::new().with("score", 2i64),
        ],
        vec![ColumnSpec::new("score")],
    )
}

#[tokio::test]
async fn order_by_desc() {
    let cache = SnapshotCache::new();
    let handle = ready_handle(&cache, "scores", scores()).await;
    let mut cursor = handle
        .query()
        .expect("pipeline")
        .order_by("score", "desc")
        .execute()
        .await
        .expect("cursor");
    assert_eq!(
        cursor.get_column("score"),
        vec![Value::Int(3), Value::Int(2), Value::Int(1)]
    );
    handle.release().expect("release");
}

#[tokio::test]
async fn order_by_string_is_case_insensitive() {
    let cache = SnapshotCache::new();
    let handle = ready_handle(
        &cache,
        "words",
        Snapshot::new(
            vec![
                Row::new().with("w", "banana"),
                Row::new().with("w", "Apple"),
                Row::new().with("w", "cherry"),
            ],
            vec![ColumnSpec::new("w")],
        ),
    )
    .await;
    let mut cursor = handle
        .query()
        .expect("pipeline")
        .order_by("w", "asc")
        .execute()
        .await
        .expect("cursor");
    assert_eq!(
        cursor.get_column("w"),
        vec![
            Value::from("Apple"),
            Value::from("banana"),
            Value::from("cherry")
        ]
    );
    handle.release().expect("release");
}

#[tokio::test]
async fn limit_keeps_a_prefix_in_original_order() {
    let cache = SnapshotCache::new();
    let handle = people_handle(&cache, "people").await;
    let mut cursor = handle
        .query()
        .expect("pipeline")
        .limit(2)
        .execute()
        .await
        .expect("cursor");
    assert_eq!(
        cursor.get_column("name"),
        vec![Value::from("Ada"), Value::from("Grace")]
    );
    handle.release().expect("release");
}

#[tokio::test]
async fn range_selects_a_window() {
    let cache = SnapshotCache::new();
    let handle = people_handle(&cache, "people").await;
    let mut cursor = handle
        .query()
        .expect("pipeline")
        .range(2, 2)
        .execute()
        .await
        .expect("cursor");
    assert_eq!(
        cursor.get_column("name"),
        vec![Value::from("Alan"), Value::from("Edsger")]
    );
    handle.release().expect("release");
}

#[tokio::test]
async fn out_of_bounds_slices_clamp() {
    let cache = SnapshotCache::new();
    let handle = people_handle(&cache, "people").await;

    let cursor = handle
        .query()
        .expect("pipeline")
        .limit(100)
        .execute()
        .await
        .expect("cursor");
    assert_eq!(cursor.count(), 5);

    let cursor = handle
        .query()
        .expect("pipeline")
        .range(10, 3)
        .execute()
        .await
        .expect("cursor");
    assert_eq!(cursor.count(), 0);

    let cursor = handle
        .query()
        .expect("pipeline")
        .range(4, 10)
        .execute()
        .await
        .expect("cursor");
    assert_eq!(cursor.count(), 1);
    handle.release().expect("release");
}

// ============================================================================
// Property tests: slice-stage laws
// ============================================================================

fn run_slice(values: Vec<i64>, build: impl FnOnce(snapquery::Pipeline) -> snapquery::Pipeline) -> Vec<i64> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime");
    runtime.block_on(async move {
        let cache = SnapshotCache::new();
        let rows = values
            .into_iter()
            .map(|v| Row::new().with("v", v))
            .collect();
        let handle = ready_handle(
            &cache,
            "prop",
            Snapshot::new(rows, vec![ColumnSpec::new("v")]),
        )
        .await;
        let pipeline = build(handle.query().expect("pipeline"));
        let mut cursor = pipeline.execute().await.expect("cursor");
        let out = cursor
            .get_column("v")
            .into_iter()
            .map(|v| v.as_int().expect("int"))
            .collect();
        handle.release().expect("release");
        out
    })
}

proptest! {
    #[test]
    fn limit_is_a_prefix(values in prop::collection::vec(-100i64..100, 0..20), n in 0usize..25) {
        let out = run_slice(values.clone(), |p| p.limit(n));
        prop_assert_eq!(out.len(), n.min(values.len()));
        prop_assert_eq!(&out[..], &values[..out.len()]);
    }

    #[test]
    fn range_is_a_window(values in prop::collection::vec(-100i64..100, 0..20), offset in 0usize..25, n in 0usize..25) {
        let out = run_slice(values.clone(), |p| p.range(offset, n));
        let expected: Vec<i64> = values.iter().copied().skip(offset).take(n).collect();
        prop_assert_eq!(out, expected);
    }

    #[test]
    fn equality_filter_is_a_subsequence(values in prop::collection::vec(-5i64..5, 0..20), needle in -5i64..5) {
        let out = run_slice(values.clone(), |p| p.filter("v", needle));
        let expected: Vec<i64> = values.into_iter().filter(|v| *v == needle).collect();
        prop_assert_eq!(out, expected);
    }
}
