//! Lazily-executed query pipelines over cached snapshots
//!
//! This crate provides:
//! - [`Pipeline`]: a chainable builder of row transformations — projection,
//!   filtering, keyword ranking, foreign-key substitution, ordering, and
//!   pagination — executed strictly in registration order against a
//!   private copy of a snapshot's rows
//! - [`Cursor`]: the position-tracking result of an execution
//! - [`HandleQueryExt`]: attaches [`query()`](HandleQueryExt::query) to a
//!   cache `Handle`
//! - [`Comparand`] / [`FilterOp`] / [`Direction`]: filter and sort inputs
//!
//! # Usage
//!
//! ```ignore
//! use snapquery_pipeline::HandleQueryExt;
//!
//! let cursor = handle
//!     .query()?
//!     .fields(["name", "age"])
//!     .filter_with("age", 30, ">", false)
//!     .order_by("name", "asc")
//!     .range(10, 10)
//!     .execute()
//!     .await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cursor;
pub mod filter;
pub mod pipeline;
pub mod search;

pub use cursor::Cursor;
pub use filter::{Comparand, Filter, FilterOp};
pub use pipeline::{Direction, HandleQueryExt, Pipeline};
pub use search::SCORE_FIELD;
