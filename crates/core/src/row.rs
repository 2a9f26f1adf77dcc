//! Open-schema row records
//!
//! A [`Row`] maps field names to [`Value`]s. Rows carry no schema of their
//! own; the shape of a result set is described separately by its
//! `ColumnSpec` list. Backed by a `BTreeMap` so field iteration and debug
//! output are deterministic.
//!
//! Rows inside a cached snapshot are never mutated; the pipeline clones
//! every row before transforming it, so callers can freely mutate what a
//! cursor hands back.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An open-schema record: field name → value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    fields: BTreeMap<String, Value>,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Row::default()
    }

    /// Builder: set a field and return the row
    ///
    /// ```
    /// use snapquery_core::{Row, Value};
    ///
    /// let row = Row::new().with("name", "Ada").with("age", 36i64);
    /// assert_eq!(row.get("age"), Some(&Value::Int(36)));
    /// ```
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Get a field value by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Set a field value, returning the previous value if any
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    /// Remove a field, returning its value if present
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Whether the row has a field with this name
    pub fn contains_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the row has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over (name, value) pairs in field-name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Iterate over field names in order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Row {
            fields: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}
