//! Filter stage, end to end

use crate::common::{people_handle, ready_handle};
use regex::Regex;
use snapquery::{ColumnSpec, HandleQueryExt, Row, Snapshot, SnapshotCache, Value};

#[tokio::test]
async fn numeric_comparison_over_rows() {
    let cache = SnapshotCache::new();
    let handle = ready_handle(
        &cache,
        "ages",
        Snapshot::new(
            vec![
                Row::new().with("age", 25i64),
                Row::new().with("age", 30i64),
                Row::new().with("age", 35i64),
            ],
            vec![ColumnSpec::new("age")],
        ),
    )
    .await;

    let mut cursor = handle
        .query()
        .expect("pipeline")
        .filter_with("age", 30, ">", false)
        .execute()
        .await
        .expect("cursor");
    assert_eq!(cursor.get_column("age"), vec![Value::Int(35)]);
    handle.release().expect("release");
}

#[tokio::test]
async fn default_equality_is_case_insensitive() {
    let cache = SnapshotCache::new();
    let handle = ready_handle(
        &cache,
        "names",
        Snapshot::new(
            vec![Row::new().with("name", "JO"), Row::new().with("name", "Sam")],
            vec![ColumnSpec::new("name")],
        ),
    )
    .await;

    let cursor = handle
        .query()
        .expect("pipeline")
        .filter("name", "Jo")
        .execute()
        .await
        .expect("cursor");
    assert_eq!(cursor.count(), 1);
    assert_eq!(cursor.rows()[0].get("name"), Some(&Value::from("JO")));
    handle.release().expect("release");
}

#[tokio::test]
async fn unknown_operator_token_behaves_as_equality() {
    let cache = SnapshotCache::new();
    let handle = people_handle(&cache, "people").await;
    let cursor = handle
        .query()
        .expect("pipeline")
        .filter_with("name", "grace", "MATCHES", false)
        .execute()
        .await
        .expect("cursor");
    assert_eq!(cursor.count(), 1);
    handle.release().expect("release");
}

#[tokio::test]
async fn pattern_comparand_over_text_fields() {
    let cache = SnapshotCache::new();
    let handle = people_handle(&cache, "people").await;
    let mut cursor = handle
        .query()
        .expect("pipeline")
        .filter("city", Regex::new("^Lon").expect("regex"))
        .execute()
        .await
        .expect("cursor");
    assert_eq!(
        cursor.get_column("name"),
        vec![Value::from("Ada"), Value::from("Alan")]
    );

    // Negated operators invert the pattern result
    let cursor = handle
        .query()
        .expect("pipeline")
        .filter_with("city", Regex::new("^Lon").expect("regex"), "!=", false)
        .execute()
        .await
        .expect("cursor");
    assert_eq!(cursor.count(), 3);
    handle.release().expect("release");
}

#[tokio::test]
async fn array_fields_match_on_any_element() {
    let cache = SnapshotCache::new();
    let handle = ready_handle(
        &cache,
        "tagged",
        Snapshot::new(
            vec![
                Row::new().with("id", 1i64).with(
                    "tags",
                    Value::Array(vec![Value::from("alpha"), Value::from("beta")]),
                ),
                Row::new()
                    .with("id", 2i64)
                    .with("tags", Value::Array(vec![Value::from("gamma")])),
            ],
            vec![ColumnSpec::new("id"), ColumnSpec::new("tags")],
        ),
    )
    .await;

    let mut cursor = handle
        .query()
        .expect("pipeline")
        .filter("tags", "BETA")
        .execute()
        .await
        .expect("cursor");
    assert_eq!(cursor.get_column("id"), vec![Value::Int(1)]);
    handle.release().expect("release");
}

#[tokio::test]
async fn chained_filters_intersect() {
    let cache = SnapshotCache::new();
    let handle = people_handle(&cache, "people").await;
    let mut cursor = handle
        .query()
        .expect("pipeline")
        .filter("city", "london")
        .filter_with("age", 40, ">=", false)
        .execute()
        .await
        .expect("cursor");
    assert_eq!(cursor.get_column("name"), vec![Value::from("Alan")]);
    handle.release().expect("release");
}
