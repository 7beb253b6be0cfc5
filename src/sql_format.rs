//! Best-effort cosmetic normalization of generated SQL.
//!
//! This is not a parser. A token that merges a keyword with punctuation
//! (e.g. `where)`) passes through verbatim; real validation is deferred to
//! execution.

use std::collections::HashSet;

use itertools::Itertools;
use lazy_static::lazy_static;

lazy_static! {
    static ref SQL_KEYWORDS: HashSet<&'static str> = [
        "select", "from", "where", "insert", "into", "values", "update",
        "set", "delete", "create", "table", "drop", "alter", "join",
        "inner", "left", "right", "full", "on", "group", "by", "having",
        "order", "asc", "desc", "and", "or", "not", "in", "is", "null",
        "like", "between", "exists", "distinct",
    ]
    .into_iter()
    .collect();
}

/// Clean a generated statement: trim, enforce a single terminal `;`
/// (trailing-whitespace-insensitive), then upper-case every
/// whitespace-delimited token whose lowercase form is exactly a keyword.
/// Whitespace runs collapse to single spaces as a side effect of the
/// token pass.
pub fn normalize_query(raw: &str) -> String {
    let mut query = raw.trim().to_string();
    if !query.ends_with(';') {
        query.push(';');
    }
    query
        .split_whitespace()
        .map(|token| {
            if SQL_KEYWORDS.contains(token.to_lowercase().as_str()) {
                token.to_uppercase()
            } else {
                token.to_string()
            }
        })
        .join(" ")
}
