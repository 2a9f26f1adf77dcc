//! Error types for snapquery
//!
//! One enum for the whole system, via `thiserror`. Structural misuse
//! (`EntryDestroyed`, `InvalidCursorPosition`) surfaces synchronously at
//! the call site; `LoadFailed` is how a failed loader reaches every
//! pipeline awaiting the entry. There is no retry logic anywhere.
//!
//! An unrecognized filter operator token is deliberately NOT an error — it
//! falls back to loose equality in the pipeline crate.

use crate::types::Signature;
use thiserror::Error;

/// Result type alias for snapquery operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the snapshot cache and query pipeline
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    /// The targeted entry is no longer present in the registry
    /// (e.g., querying after the last holder released).
    #[error("snapshot entry destroyed: {0}")]
    EntryDestroyed(Signature),

    /// `Cursor::current()` was invoked with the position out of range
    #[error("invalid cursor position {position} (rows: {len})")]
    InvalidCursorPosition {
        /// The cursor position at the time of the call
        position: usize,
        /// Number of rows in the cursor
        len: usize,
    },

    /// The external loader for an entry settled with a failure; every
    /// pipeline bound to the entry observes this instead of waiting forever.
    #[error("snapshot load failed: {0}")]
    LoadFailed(String),
}
