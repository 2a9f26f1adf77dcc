//! The transformation pipeline
//!
//! A [`Pipeline`] is a builder bound to exactly one snapshot entry at
//! construction. Each configuration call pushes one [`Stage`] onto an
//! ordered list and hands the pipeline back for chaining; nothing touches
//! rows until [`execute`](Pipeline::execute).
//!
//! Execution awaits the entry's readiness, clones every row of the
//! snapshot into a private working set, then folds the stages over it
//! strictly in registration order — each stage's result is complete before
//! the next stage starts. Only the join stage suspends (once per foreign
//! lookup); every other stage is a pure synchronous transformation.
//!
//! # Ordering
//!
//! Stages are never reordered or fused; `filter(...).limit(5)` and
//! `limit(5).filter(...)` are different queries, as registered.

use crate::cursor::Cursor;
use crate::filter::{sort_cmp, Comparand, Filter, FilterOp};
use crate::search::{parse_keywords, score_rows};
use snapquery_cache::{Handle, SnapshotCache, SnapshotEntry};
use snapquery_core::{Result, Row, Signature, Value};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::trace;

// ============================================================================
// Direction
// ============================================================================

/// Sort direction for the `order_by` stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Ascending
    Asc,
    /// Descending
    Desc,
}

impl Direction {
    /// Parse a direction token: `"asc"` sorts ascending, anything else
    /// descending.
    pub fn from_token(token: &str) -> Self {
        if token == "asc" {
            Direction::Asc
        } else {
            Direction::Desc
        }
    }
}

impl From<&str> for Direction {
    fn from(token: &str) -> Self {
        Direction::from_token(token)
    }
}

// ============================================================================
// Stages
// ============================================================================

/// One registered row-sequence transformation. The set is closed: stages
/// run exactly as registered, with no planning or reordering.
#[derive(Debug, Clone)]
enum Stage {
    Fields(Vec<String>),
    Filter(Filter),
    Search {
        fields: Vec<String>,
        keywords: Vec<String>,
    },
    Substitute {
        field: String,
        cache: SnapshotCache,
        foreign: Signature,
        key_field: String,
    },
    OrderBy {
        field: String,
        direction: Direction,
    },
    Limit(usize),
    Range {
        offset: usize,
        len: usize,
    },
}

// ============================================================================
// Pipeline
// ============================================================================

/// Lazily-executed chain of row transformations over one cached snapshot.
///
/// # Example
///
/// ```ignore
/// use snapquery_pipeline::HandleQueryExt;
///
/// let cursor = handle
///     .query()?
///     .filter("status", "active")
///     .order_by("age", "desc")
///     .limit(10)
///     .execute()
///     .await?;
/// ```
#[derive(Debug)]
pub struct Pipeline {
    entry: Arc<SnapshotEntry>,
    stages: Vec<Stage>,
    projection: Option<Vec<String>>,
}

impl Pipeline {
    /// Bind a fresh pipeline to a snapshot entry. The binding is permanent;
    /// a pipeline never rebinds.
    pub(crate) fn bound(entry: Arc<SnapshotEntry>) -> Self {
        Pipeline {
            entry,
            stages: Vec::new(),
            projection: None,
        }
    }

    /// Append a projection stage: every output row carries exactly the
    /// listed fields, `Null` where the input row lacks one.
    ///
    /// The first registered projection also selects the final column list;
    /// later projections reshape rows but leave the column selection alone.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list: Vec<String> = fields.into_iter().map(Into::into).collect();
        if self.projection.is_none() {
            self.projection = Some(list.clone());
        }
        self.stages.push(Stage::Fields(list));
        self
    }

    /// Append a predicate stage under loose, case-insensitive equality.
    ///
    /// Shorthand for `filter_with(field, value, "==", false)`.
    pub fn filter(self, field: &str, value: impl Into<Comparand>) -> Self {
        self.filter_with(field, value, "==", false)
    }

    /// Append a predicate stage with an explicit operator token and case
    /// flag.
    ///
    /// Operator tokens: `==`, `===`, `!=`, `!==`, `<`, `>`, `<=`, `>=`.
    /// An unrecognized token silently behaves as `==`. Pass a
    /// `regex::Regex` as the value for pattern matching.
    pub fn filter_with(
        mut self,
        field: &str,
        value: impl Into<Comparand>,
        operator: &str,
        case_sensitive: bool,
    ) -> Self {
        self.stages.push(Stage::Filter(Filter::new(
            field,
            value,
            FilterOp::from_token(operator),
            case_sensitive,
        )));
        self
    }

    /// Append a ranking/filter stage: rows are scored against the
    /// whitespace-split, lowercased keywords and rows that match nothing
    /// are dropped.
    pub fn search<I, S>(mut self, fields: I, keyword_string: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stages.push(Stage::Search {
            fields: fields.into_iter().map(Into::into).collect(),
            keywords: parse_keywords(keyword_string),
        });
        self
    }

    /// Append a join stage: each row's `field` is replaced by the foreign
    /// row whose `key_field` equals it (or `Null` when none matches).
    ///
    /// Scalar values resolve to a single nested row; `Null` and absent
    /// values resolve to `Null` without a lookup; array values resolve
    /// element-wise, preserving order. Lookups run strictly one at a time.
    ///
    /// The stage captures the foreign signature, not the handle; if the
    /// foreign entry is destroyed before execution, `execute` fails with
    /// `EntryDestroyed`.
    pub fn substitute(mut self, field: &str, foreign: &Handle, key_field: &str) -> Self {
        self.stages.push(Stage::Substitute {
            field: field.to_string(),
            cache: foreign.cache().clone(),
            foreign: foreign.signature().clone(),
            key_field: key_field.to_string(),
        });
        self
    }

    /// Append a sort stage over the named field. Strings compare
    /// case-insensitively; equal keys keep no particular relative order.
    pub fn order_by(mut self, field: &str, direction: impl Into<Direction>) -> Self {
        self.stages.push(Stage::OrderBy {
            field: field.to_string(),
            direction: direction.into(),
        });
        self
    }

    /// Append a truncation stage keeping the first `n` rows
    pub fn limit(mut self, n: usize) -> Self {
        self.stages.push(Stage::Limit(n));
        self
    }

    /// Append a slice stage keeping `n` rows starting at `offset`
    pub fn range(mut self, offset: usize, n: usize) -> Self {
        self.stages.push(Stage::Range { offset, len: n });
        self
    }

    /// Execute the pipeline: await readiness, copy the snapshot's rows,
    /// fold every stage in registration order, and wrap the result in a
    /// [`Cursor`].
    ///
    /// The working rows are independent copies; mutating rows obtained
    /// from the cursor never touches the cached snapshot.
    pub async fn execute(self) -> Result<Cursor> {
        let Pipeline {
            entry,
            stages,
            projection,
        } = self;

        entry.wait_ready().await?;
        let snapshot = entry.snapshot_ready()?;
        let mut rows: Vec<Row> = snapshot.rows.clone();
        trace!(signature = %entry.signature(), rows = rows.len(), stages = stages.len(), "pipeline started");

        for stage in &stages {
            rows = apply_stage(stage, rows).await?;
            trace!(rows = rows.len(), "stage applied");
        }

        let columns = match &projection {
            Some(selected) => snapshot
                .columns
                .iter()
                .filter(|column| selected.iter().any(|name| *name == column.name))
                .cloned()
                .collect(),
            None => snapshot.columns.clone(),
        };
        Ok(Cursor::new(rows, columns))
    }

    /// Execute and hand the cursor to `callback`, returning its result.
    /// A terminal consumption helper, not a stage.
    pub async fn then<T>(self, callback: impl FnOnce(Cursor) -> T) -> Result<T> {
        Ok(callback(self.execute().await?))
    }
}

// ============================================================================
// Stage application
// ============================================================================

async fn apply_stage(stage: &Stage, rows: Vec<Row>) -> Result<Vec<Row>> {
    match stage {
        Stage::Fields(fields) => Ok(project_rows(rows, fields)),
        Stage::Filter(filter) => Ok(rows.into_iter().filter(|row| filter.matches(row)).collect()),
        Stage::Search { fields, keywords } => Ok(score_rows(rows, fields, keywords)),
        Stage::Substitute {
            field,
            cache,
            foreign,
            key_field,
        } => substitute_rows(rows, field, cache, foreign, key_field).await,
        Stage::OrderBy { field, direction } => Ok(order_rows(rows, field, *direction)),
        Stage::Limit(n) => {
            let mut rows = rows;
            rows.truncate(*n);
            Ok(rows)
        }
        Stage::Range { offset, len } => Ok(rows.into_iter().skip(*offset).take(*len).collect()),
    }
}

fn project_rows(rows: Vec<Row>, fields: &[String]) -> Vec<Row> {
    rows.into_iter()
        .map(|row| {
            fields
                .iter()
                .map(|field| {
                    let value = row.get(field).cloned().unwrap_or(Value::Null);
                    (field.clone(), value)
                })
                .collect()
        })
        .collect()
}

fn order_rows(mut rows: Vec<Row>, field: &str, direction: Direction) -> Vec<Row> {
    const NULL_KEY: &Value = &Value::Null;
    rows.sort_by(|a, b| {
        let ordering = sort_cmp(
            a.get(field).unwrap_or(NULL_KEY),
            b.get(field).unwrap_or(NULL_KEY),
        );
        match direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    });
    rows
}

/// Resolve the join field of every row, strictly in sequence.
///
/// One foreign lookup is outstanding at any moment — rows, and elements
/// within an array-valued row, resolve one after another. This bounds the
/// work a single join can put on the foreign snapshot at once.
async fn substitute_rows(
    mut rows: Vec<Row>,
    field: &str,
    cache: &SnapshotCache,
    foreign: &Signature,
    key_field: &str,
) -> Result<Vec<Row>> {
    for row in rows.iter_mut() {
        let current = row.get(field).cloned().unwrap_or(Value::Null);
        let replacement = match current {
            Value::Array(elements) => {
                let mut resolved = Vec::with_capacity(elements.len());
                for element in elements {
                    resolved.push(resolve_scalar(cache, foreign, key_field, element).await?);
                }
                Value::Array(resolved)
            }
            scalar => resolve_scalar(cache, foreign, key_field, scalar).await?,
        };
        row.insert(field, replacement);
    }
    Ok(rows)
}

async fn resolve_scalar(
    cache: &SnapshotCache,
    foreign: &Signature,
    key_field: &str,
    value: Value,
) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    let entry = cache.lookup(foreign)?;
    let lookup = Pipeline::bound(entry).filter(key_field, value).limit(1);
    // Boxed to break the execute → substitute → execute cycle in the
    // future type.
    let execution: Pin<Box<dyn Future<Output = Result<Cursor>>>> =
        Box::pin(lookup.execute());
    let cursor = execution.await?;
    Ok(match cursor.rows().first() {
        Some(row) => Value::Record(row.clone()),
        None => Value::Null,
    })
}

// ============================================================================
// Handle extension
// ============================================================================

/// Extension trait attaching query construction to a cache [`Handle`].
///
/// Lives here rather than in the cache crate so the cache stays free of
/// query semantics.
pub trait HandleQueryExt {
    /// Open a fresh pipeline over the handle's entry.
    ///
    /// Fails with `EntryDestroyed` when the entry has left the registry.
    fn query(&self) -> Result<Pipeline>;
}

impl HandleQueryExt for Handle {
    fn query(&self) -> Result<Pipeline> {
        Ok(Pipeline::bound(self.entry()?))
    }
}
