//! Keyword ranking for the search stage
//!
//! Scoring model: each row starts at 1.0 (or at its existing
//! `search_score` — consecutive search stages compound). For every
//! (field, keyword) pair over string-valued fields, a keyword found at
//! byte offset `pos` of the lowercased field text of length `len`
//! multiplies the score by `sqrt(1 - pos/len)` — earlier occurrences are
//! worth more, an occurrence at the very start is worth 1. A keyword
//! absent from the field halves the score. A row where no field matched
//! any keyword scores 0 and is dropped.
//!
//! The score rides on rows under the `search_score` field but is never
//! added to the column list.

use snapquery_core::{Row, Value};

/// Field that carries the accumulated score on scored rows.
pub const SCORE_FIELD: &str = "search_score";

/// Split a raw keyword string into lowercased keywords.
///
/// Whitespace splitting drops empty tokens, so an all-whitespace query
/// produces no keywords (and therefore no matches).
pub(crate) fn parse_keywords(keyword_string: &str) -> Vec<String> {
    keyword_string
        .split_whitespace()
        .map(str::to_lowercase)
        .collect()
}

/// Score every row, keeping only rows with a positive score.
pub(crate) fn score_rows(rows: Vec<Row>, fields: &[String], keywords: &[String]) -> Vec<Row> {
    rows.into_iter()
        .filter_map(|mut row| {
            let mut score = row
                .get(SCORE_FIELD)
                .and_then(Value::as_number)
                .unwrap_or(1.0);
            let mut matched = false;

            for field in fields {
                let text = match row.get(field) {
                    Some(Value::String(s)) => s.to_lowercase(),
                    _ => continue,
                };
                let len = text.len() as f64;
                for keyword in keywords {
                    match text.find(keyword.as_str()) {
                        Some(pos) => {
                            matched = true;
                            score *= (1.0 - pos as f64 / len).sqrt();
                        }
                        None => score *= 0.5,
                    }
                }
            }

            if !matched {
                return None;
            }
            row.insert(SCORE_FIELD, Value::Float(score));
            Some(row)
        })
        .collect()
}
