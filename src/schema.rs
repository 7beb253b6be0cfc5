//! Schema extraction from the active SQLite database.

use std::path::Path;

use itertools::Itertools;
use rusqlite::{Connection, OpenFlags};

use crate::error::{PipelineError, Result};

/// Read every table-defining statement from the database's system catalog
/// and join them with newlines, in catalog-return order.
///
/// The order is whatever the engine yields; it is deliberately not
/// re-sorted, so the prompt built from it is deterministic for a given
/// file. Extraction is performed fresh on every call - there is no cache
/// to go stale when the active database is replaced.
pub fn extract_schema(path: &Path) -> Result<String> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|e| {
            PipelineError::Storage(format!("cannot open database {}: {}", path.display(), e))
        })?;

    let mut stmt = conn
        .prepare("SELECT sql FROM sqlite_master WHERE type='table'")
        .map_err(|e| PipelineError::Storage(format!("cannot read catalog: {}", e)))?;

    let statements: Vec<Option<String>> = stmt
        .query_map([], |row| row.get(0))
        .map_err(|e| PipelineError::Storage(format!("cannot read catalog: {}", e)))?
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| PipelineError::Storage(format!("cannot read catalog: {}", e)))?;

    Ok(statements.into_iter().flatten().join("\n"))
}
