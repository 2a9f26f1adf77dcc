//! snapquery — deduplicated in-process snapshot cache with a lazy query
//! pipeline
//!
//! Many logical consumers ask for the "same" dataset, identified by an
//! opaque signature. The cache materializes it at most once per signature
//! no matter how many requesters race in (single-flight), tracks holders by
//! reference counting, and evicts either immediately (last holder releases)
//! or after a TTL decay. Queries over a cached snapshot are composed as a
//! chain of transformation stages that run lazily, in registration order,
//! against a private copy of the rows.
//!
//! # Quick Start
//!
//! ```ignore
//! use snapquery::{HandleQueryExt, Snapshot, SnapshotCache};
//!
//! let cache = SnapshotCache::new();
//!
//! // First acquire triggers the loader; concurrent acquires for the same
//! // signature attach to the same in-flight load.
//! let users = cache.acquire("users:all", || async {
//!     Ok(Snapshot::new(fetch_rows().await?, fetch_columns().await?))
//! });
//!
//! let cursor = users
//!     .query()?
//!     .filter("status", "active")
//!     .order_by("name", "asc")
//!     .limit(20)
//!     .execute()
//!     .await?;
//!
//! users.release()?;
//! ```
//!
//! # Architecture
//!
//! - `snapquery-core`: the value/row data model and error surface
//! - `snapquery-cache`: single-flight registry, refcounts, TTL decay
//! - `snapquery-pipeline`: transformation stages and cursors

// Re-export the public API from the member crates
pub use snapquery_cache::{Handle, LoadState, SnapshotCache, SnapshotEntry};
pub use snapquery_core::{ColumnSpec, Error, Result, Row, Signature, Snapshot, Value};
pub use snapquery_pipeline::{
    Comparand, Cursor, Direction, Filter, FilterOp, HandleQueryExt, Pipeline, SCORE_FIELD,
};
