//! Cursor behavior over real execution results

use crate::common::people_handle;
use snapquery::{ColumnSpec, Error, HandleQueryExt, SnapshotCache, Value};

#[tokio::test]
async fn iteration_walks_every_row() {
    let cache = SnapshotCache::new();
    let handle = people_handle(&cache, "people").await;
    let mut cursor = handle
        .query()
        .expect("pipeline")
        .order_by("age", "asc")
        .execute()
        .await
        .expect("cursor");

    let mut ages = Vec::new();
    while cursor.valid() {
        let row = cursor.current().expect("valid");
        ages.push(row.get("age").cloned().expect("age"));
        cursor.next();
    }
    assert_eq!(ages.len(), 5);
    assert_eq!(ages[0], Value::Int(36));
    assert_eq!(ages[4], Value::Int(72));

    // Past the end: valid() is false and current() reports the misuse
    assert!(!cursor.valid());
    assert!(matches!(
        cursor.current().expect_err("past the end"),
        Error::InvalidCursorPosition { position: 5, len: 5 }
    ));

    cursor.rewind();
    assert_eq!(cursor.key(), 0);
    assert!(cursor.current().is_ok());
    handle.release().expect("release");
}

#[tokio::test]
async fn get_column_walks_and_parks_at_the_end() {
    let cache = SnapshotCache::new();
    let handle = people_handle(&cache, "people").await;
    let mut cursor = handle
        .query()
        .expect("pipeline")
        .execute()
        .await
        .expect("cursor");

    let cities = cursor.get_column("city");
    assert_eq!(cities.len(), 5);
    assert_eq!(cities[0], Value::from("London"));
    assert_eq!(cursor.key(), cursor.count());
    assert!(!cursor.valid());
    handle.release().expect("release");
}

#[tokio::test]
async fn add_column_extends_rows_and_columns() {
    let cache = SnapshotCache::new();
    let handle = people_handle(&cache, "people").await;
    let mut cursor = handle
        .query()
        .expect("pipeline")
        .limit(2)
        .execute()
        .await
        .expect("cursor");

    cursor.add_column(
        ColumnSpec::new("rank").with_type("int"),
        vec![Value::Int(1), Value::Int(2)],
    );
    assert_eq!(cursor.columns().len(), 4);
    assert_eq!(cursor.rows()[0].get("rank"), Some(&Value::Int(1)));
    assert_eq!(cursor.rows()[1].get("rank"), Some(&Value::Int(2)));

    // The appended column reads back like any other
    assert_eq!(
        cursor.get_column("rank"),
        vec![Value::Int(1), Value::Int(2)]
    );
    handle.release().expect("release");
}
