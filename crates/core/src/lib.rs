//! Core data model for snapquery
//!
//! This crate defines the types shared by the snapshot cache and the query
//! pipeline:
//!
//! - [`Value`]: the closed set of field value kinds
//! - [`Row`]: open-schema record, field name → value
//! - [`ColumnSpec`] / [`Snapshot`]: result-set shape and the loader payload
//! - [`Signature`]: the opaque cache key
//! - [`Error`] / [`Result`]: the system-wide error surface
//!
//! Nothing here is concurrent or async; lifecycle coordination lives in
//! `snapquery-cache` and transformation semantics in `snapquery-pipeline`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod row;
pub mod types;
pub mod value;

pub use error::{Error, Result};
pub use row::Row;
pub use types::{ColumnSpec, Signature, Snapshot};
pub use value::Value;
