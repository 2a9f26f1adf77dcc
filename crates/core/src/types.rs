//! Shared identifier and shape types
//!
//! - [`Signature`]: the opaque stable key identifying a cached dataset.
//! - [`ColumnSpec`]: ordered column metadata describing a result set.
//! - [`Snapshot`]: the rows + columns a loader materializes exactly once.

use crate::row::Row;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Signature
// ============================================================================

/// Opaque stable key identifying a dataset in the cache.
///
/// The cache never interprets the contents; equality and hashing are all
/// that matter. Signature computation is the caller's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(String);

impl Signature {
    /// Create a signature from any string-like key
    pub fn new(key: impl Into<String>) -> Self {
        Signature(key.into())
    }

    /// The underlying key text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Signature {
    fn from(s: &str) -> Self {
        Signature(s.to_string())
    }
}

impl From<String> for Signature {
    fn from(s: String) -> Self {
        Signature(s)
    }
}

// ============================================================================
// ColumnSpec
// ============================================================================

/// Metadata for one column of a result set.
///
/// `data_type` is advisory only — rows are open-schema and never validated
/// against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column name, matching a row field name
    pub name: String,
    /// Optional type annotation supplied by the loader
    pub data_type: Option<String>,
}

impl ColumnSpec {
    /// Create a column spec with no type annotation
    pub fn new(name: impl Into<String>) -> Self {
        ColumnSpec {
            name: name.into(),
            data_type: None,
        }
    }

    /// Builder: set the type annotation
    pub fn with_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// The immutable payload of one cache entry: ordered rows plus ordered
/// column metadata, produced by the external loader exactly once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Ordered row sequence
    pub rows: Vec<Row>,
    /// Ordered column metadata
    pub columns: Vec<ColumnSpec>,
}

impl Snapshot {
    /// Create a snapshot from rows and columns
    pub fn new(rows: Vec<Row>, columns: Vec<ColumnSpec>) -> Self {
        Snapshot { rows, columns }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the snapshot holds no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
