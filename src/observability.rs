//! Structured per-request query logging.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// One `ask` request, from question to outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryLogEntry {
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
    pub question: String,
    pub sql_generated: Option<String>,
    pub rows_returned: Option<usize>,
    pub execution_time_ms: u64,
    pub success: bool,
    pub error_message: Option<String>,
}

impl QueryLogEntry {
    /// Emit the entry as a single JSON line on the query-log target.
    pub fn emit(&self) {
        match serde_json::to_string(self) {
            Ok(json) => info!(target: "askdb::query_log", "{}", json),
            Err(e) => info!(target: "askdb::query_log", "unserializable query log entry: {}", e),
        }
    }
}
