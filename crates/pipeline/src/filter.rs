//! Row predicate semantics for the filter stage
//!
//! A [`Filter`] tests one named field of a row against a [`Comparand`]
//! under a [`FilterOp`]. The semantics mirror a loosely-typed query
//! surface:
//!
//! - `==`/`!=` coerce: `Int`/`Float` compare numerically, numeric strings
//!   coerce to numbers, `Bool` coerces to 0/1, `Null` equals only
//!   `Null`/absent.
//! - `===`/`!==` stay within a type class; numbers still compare
//!   numerically across `Int`/`Float` (the cached datasets come from
//!   single-number-type sources, where `30` and `30.0` are the same value).
//! - Ordering operators compare numerically when both sides coerce to
//!   numbers, lexicographically when both are strings, and otherwise fail
//!   the predicate.
//! - Unless `case_sensitive`, string comparands on both sides are
//!   lowercased first.
//! - A `Pattern` comparand redefines matching as "stored value rendered as
//!   text and tested against the regex"; `!=`/`!==` invert, every other
//!   operator behaves as a positive match. The case-sensitivity flag does
//!   not apply — the pattern carries its own.
//! - An `Array` field matches when ANY element satisfies the predicate.
//! - An absent field is tested as `Null`.
//!
//! An unrecognized operator token is not an error: it parses as `==`.

use regex::Regex;
use snapquery_core::{Row, Value};
use std::cmp::Ordering;

// ============================================================================
// FilterOp
// ============================================================================

/// Comparison operator for the filter stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// Loose, type-coercing equality (`==`)
    Eq,
    /// Type-class-preserving equality (`===`)
    StrictEq,
    /// Negation of `Eq` (`!=`)
    Ne,
    /// Negation of `StrictEq` (`!==`)
    StrictNe,
    /// Less than (`<`)
    Lt,
    /// Greater than (`>`)
    Gt,
    /// Less than or equal (`<=`)
    Le,
    /// Greater than or equal (`>=`)
    Ge,
}

impl FilterOp {
    /// Parse an operator token. Unknown tokens silently fall back to loose
    /// equality; a malformed operator is not an error.
    pub fn from_token(token: &str) -> Self {
        match token {
            "===" => FilterOp::StrictEq,
            "!==" => FilterOp::StrictNe,
            "!=" => FilterOp::Ne,
            "<" => FilterOp::Lt,
            ">" => FilterOp::Gt,
            "<=" => FilterOp::Le,
            ">=" => FilterOp::Ge,
            _ => FilterOp::Eq,
        }
    }

    fn is_negated(self) -> bool {
        matches!(self, FilterOp::Ne | FilterOp::StrictNe)
    }
}

// ============================================================================
// Comparand
// ============================================================================

/// The right-hand side of a filter predicate: a plain value or a regex
/// pattern.
#[derive(Debug, Clone)]
pub enum Comparand {
    /// Compare against a concrete value
    Value(Value),
    /// Test the stored value's text rendering against a pattern
    Pattern(Regex),
}

impl From<Value> for Comparand {
    fn from(v: Value) -> Self {
        Comparand::Value(v)
    }
}

impl From<Regex> for Comparand {
    fn from(re: Regex) -> Self {
        Comparand::Pattern(re)
    }
}

impl From<&str> for Comparand {
    fn from(s: &str) -> Self {
        Comparand::Value(Value::from(s))
    }
}

impl From<String> for Comparand {
    fn from(s: String) -> Self {
        Comparand::Value(Value::from(s))
    }
}

impl From<i64> for Comparand {
    fn from(i: i64) -> Self {
        Comparand::Value(Value::Int(i))
    }
}

impl From<i32> for Comparand {
    fn from(i: i32) -> Self {
        Comparand::Value(Value::Int(i as i64))
    }
}

impl From<f64> for Comparand {
    fn from(f: f64) -> Self {
        Comparand::Value(Value::Float(f))
    }
}

impl From<bool> for Comparand {
    fn from(b: bool) -> Self {
        Comparand::Value(Value::Bool(b))
    }
}

// ============================================================================
// Filter
// ============================================================================

/// One registered filter predicate: field, comparand, operator, case flag.
#[derive(Debug, Clone)]
pub struct Filter {
    field: String,
    comparand: Comparand,
    op: FilterOp,
    case_sensitive: bool,
}

impl Filter {
    /// Create a predicate over the named field
    pub fn new(
        field: impl Into<String>,
        comparand: impl Into<Comparand>,
        op: FilterOp,
        case_sensitive: bool,
    ) -> Self {
        Filter {
            field: field.into(),
            comparand: comparand.into(),
            op,
            case_sensitive,
        }
    }

    /// Whether the row passes this predicate.
    ///
    /// An array-valued field matches when any element matches; an absent
    /// field is tested as `Null`.
    pub fn matches(&self, row: &Row) -> bool {
        match row.get(&self.field) {
            Some(Value::Array(elements)) => elements.iter().any(|v| self.matches_value(v)),
            Some(value) => self.matches_value(value),
            None => self.matches_value(&Value::Null),
        }
    }

    fn matches_value(&self, stored: &Value) -> bool {
        match &self.comparand {
            Comparand::Pattern(pattern) => {
                let matched = value_text(stored)
                    .map(|text| pattern.is_match(&text))
                    .unwrap_or(false);
                if self.op.is_negated() {
                    !matched
                } else {
                    matched
                }
            }
            Comparand::Value(target) => {
                let cs = self.case_sensitive;
                match self.op {
                    FilterOp::Eq => loose_eq(stored, target, cs),
                    FilterOp::Ne => !loose_eq(stored, target, cs),
                    FilterOp::StrictEq => strict_eq(stored, target, cs),
                    FilterOp::StrictNe => !strict_eq(stored, target, cs),
                    FilterOp::Lt => {
                        matches!(relate(stored, target, cs), Some(Ordering::Less))
                    }
                    FilterOp::Gt => {
                        matches!(relate(stored, target, cs), Some(Ordering::Greater))
                    }
                    FilterOp::Le => matches!(
                        relate(stored, target, cs),
                        Some(Ordering::Less | Ordering::Equal)
                    ),
                    FilterOp::Ge => matches!(
                        relate(stored, target, cs),
                        Some(Ordering::Greater | Ordering::Equal)
                    ),
                }
            }
        }
    }
}

// ============================================================================
// Comparison semantics
// ============================================================================

/// Text rendering for pattern matching: strings as-is, numbers via their
/// display form, everything else untestable.
fn value_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Int(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        _ => None,
    }
}

fn fold(s: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        s.to_string()
    } else {
        s.to_lowercase()
    }
}

/// Loose, coercing equality
pub(crate) fn loose_eq(a: &Value, b: &Value, case_sensitive: bool) -> bool {
    match (a, b) {
        (Value::String(x), Value::String(y)) => fold(x, case_sensitive) == fold(y, case_sensitive),
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Array(_) | Value::Record(_), _) | (_, Value::Array(_) | Value::Record(_)) => false,
        _ => match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

/// Equality within a type class: numbers with numbers (numerically),
/// strings with strings, bools with bools, null with null.
pub(crate) fn strict_eq(a: &Value, b: &Value, case_sensitive: bool) -> bool {
    match (a, b) {
        (Value::String(x), Value::String(y)) => fold(x, case_sensitive) == fold(y, case_sensitive),
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Null, Value::Null) => true,
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            match (a.as_number(), b.as_number()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            }
        }
        _ => false,
    }
}

/// Relational comparison for `<`, `>`, `<=`, `>=`: strings
/// lexicographically, otherwise numerically when both sides coerce.
/// `None` fails the predicate.
fn relate(a: &Value, b: &Value, case_sensitive: bool) -> Option<Ordering> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => {
            Some(fold(x, case_sensitive).cmp(&fold(y, case_sensitive)))
        }
        _ => {
            let x = a.as_number()?;
            let y = b.as_number()?;
            x.partial_cmp(&y)
        }
    }
}

// ============================================================================
// Sort key ordering
// ============================================================================

/// Total order over sort keys for the `order_by` stage.
///
/// Strings compare case-insensitively; `Int`/`Float`/`Bool` compare
/// numerically (NaN sorts after every number, equal to itself); remaining
/// kinds fall back to a fixed type-class rank so mixed-type columns still
/// sort deterministically. Loosely-equal keys within a class compare equal,
/// which is all the stage promises about their relative order.
pub(crate) fn sort_cmp(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) | Value::Int(_) | Value::Float(_) => 1,
            Value::String(_) => 2,
            Value::Array(_) => 3,
            Value::Record(_) => 4,
        }
    }

    match (a, b) {
        (Value::String(x), Value::String(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
        _ if rank(a) == 1 && rank(b) == 1 => {
            // as_number is total for Bool/Int/Float
            let x = a.as_number().unwrap_or(f64::NAN);
            let y = b.as_number().unwrap_or(f64::NAN);
            match x.partial_cmp(&y) {
                Some(ordering) => ordering,
                None => match (x.is_nan(), y.is_nan()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    (false, false) => Ordering::Equal,
                },
            }
        }
        _ => rank(a).cmp(&rank(b)),
    }
}
