//! Query execution against the active database, with failure isolation.

use std::path::Path;

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PipelineError, Result};

/// Tabular result of a successfully executed statement. Column order and
/// row order are the engine's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Rows as column-name -> value records, the response wire shape.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| self.columns.iter().cloned().zip(row.iter().cloned()).collect())
            .collect()
    }
}

/// Execute one normalized statement against the database at `path`.
///
/// Any engine failure (syntax error, missing table, type error, constraint
/// violation) is converted into an `Execution` error carrying the engine's
/// message; none may escape as a fault. The connection is scoped to this
/// call and released on every exit path.
pub fn execute_query(query: &str, path: &Path) -> Result<QueryResult> {
    // No CREATE flag: a missing active database must fail, not materialize
    // as an empty file.
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_WRITE)
        .map_err(|e| PipelineError::Execution(e.to_string()))?;

    let mut stmt = conn
        .prepare(query)
        .map_err(|e| PipelineError::Execution(e.to_string()))?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let column_count = columns.len();

    let mut collected = Vec::new();
    let mut rows = stmt
        .query([])
        .map_err(|e| PipelineError::Execution(e.to_string()))?;
    while let Some(row) = rows
        .next()
        .map_err(|e| PipelineError::Execution(e.to_string()))?
    {
        let mut record = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            let value = row
                .get_ref(idx)
                .map_err(|e| PipelineError::Execution(e.to_string()))?;
            record.push(value_to_json(value));
        }
        collected.push(record);
    }

    Ok(QueryResult {
        columns,
        rows: collected,
    })
}

fn value_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(text) => Value::String(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(blob) => {
            Value::String(blob.iter().map(|byte| format!("{:02x}", byte)).collect())
        }
    }
}
