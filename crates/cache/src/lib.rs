//! Single-flight, reference-counted snapshot cache
//!
//! This crate owns the lifecycle half of snapquery:
//!
//! - [`SnapshotCache`]: signature → entry registry with single-flight
//!   loading (one loader invocation per live entry, ever), reference
//!   counting, and two eviction paths — immediate (last holder releases)
//!   and delayed (TTL decay).
//! - [`SnapshotEntry`]: one cached dataset; payload written once at load
//!   completion, readiness broadcast to every holder.
//! - [`Handle`]: one countable reference; consumed by `release`/`expire`.
//!
//! Query composition over a cached snapshot lives in `snapquery-pipeline`,
//! which attaches `query()` to [`Handle`] via an extension trait.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod entry;
pub mod handle;

pub use cache::SnapshotCache;
pub use entry::{LoadState, SnapshotEntry};
pub use handle::Handle;
