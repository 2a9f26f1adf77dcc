//! Result cursors
//!
//! A [`Cursor`] is the terminal output of a pipeline execution: an
//! immutable ordered row sequence plus its column metadata, with a single
//! mutable 0-based position. Positions are per-cursor; two cursors over
//! the same execution result never share state.
//!
//! `next()` deliberately performs no bound check — iteration is
//! `while cursor.valid() { ...; cursor.next(); }` with [`Cursor::valid`]
//! as the caller's guard, and only [`Cursor::current`] fails on an
//! out-of-range position.

use snapquery_core::{ColumnSpec, Error, Result, Row, Value};

/// Forward-only, position-tracking view over a finalized row sequence.
#[derive(Debug, Clone)]
pub struct Cursor {
    rows: Vec<Row>,
    columns: Vec<ColumnSpec>,
    position: usize,
}

impl Cursor {
    pub(crate) fn new(rows: Vec<Row>, columns: Vec<ColumnSpec>) -> Self {
        Cursor {
            rows,
            columns,
            position: 0,
        }
    }

    /// Number of rows
    pub fn count(&self) -> usize {
        self.rows.len()
    }

    /// The bound column metadata, in order
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// The row at the current position
    pub fn current(&self) -> Result<&Row> {
        self.rows
            .get(self.position)
            .ok_or(Error::InvalidCursorPosition {
                position: self.position,
                len: self.rows.len(),
            })
    }

    /// The current position
    pub fn key(&self) -> usize {
        self.position
    }

    /// Advance the position by one, without a bound check
    pub fn next(&mut self) {
        self.position += 1;
    }

    /// Reset the position to 0
    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// Whether the current position indexes an existing row
    pub fn valid(&self) -> bool {
        self.position < self.rows.len()
    }

    /// The full row sequence, in order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Consume the cursor, yielding the row sequence
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Collect the named field from every row, in row order (`Null` where
    /// a row lacks the field).
    ///
    /// Rewinds first and walks the whole sequence, leaving the position at
    /// the end — the walk is observable through [`Cursor::key`].
    pub fn get_column(&mut self, name: &str) -> Vec<Value> {
        self.rewind();
        let mut values = Vec::with_capacity(self.rows.len());
        while self.valid() {
            let value = self.rows[self.position]
                .get(name)
                .cloned()
                .unwrap_or(Value::Null);
            values.push(value);
            self.next();
        }
        values
    }

    /// Append a column: the spec joins the column list and `values[i]` is
    /// inserted into row `i` under the spec's name.
    ///
    /// The caller guarantees `values` has one element per row.
    pub fn add_column(&mut self, spec: ColumnSpec, values: Vec<Value>) {
        debug_assert_eq!(values.len(), self.rows.len(), "one value per row");
        let name = spec.name.clone();
        self.columns.push(spec);
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.insert(name.clone(), value);
        }
    }
}
