//! Pipeline orchestration: the single active-database slot and the two
//! request operations, `upload_database` and `ask`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{Config, DATABASE_EXTENSION, DATABASE_FILE_NAME};
use crate::error::{PipelineError, Result};
use crate::executor::{self, QueryResult};
use crate::llm::InferenceGateway;
use crate::observability::QueryLogEntry;
use crate::prompts::QUERY_PROMPT;
use crate::schema::extract_schema;
use crate::sql_format::normalize_query;
use crate::summarize;

/// Successful outcome of `ask`: the normalized query, the execution result
/// as row records, and its natural-language interpretation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub query: String,
    pub result: Vec<Map<String, Value>>,
    pub interpretation: String,
}

/// Composes schema extraction, prompt construction, generation, query
/// normalization, execution and summarization over one active-database
/// slot.
///
/// Each instance owns its own database path, so independent pipelines can
/// coexist (and be tested) without process-wide state.
pub struct QueryPipeline {
    gateway: Arc<dyn InferenceGateway>,
    database_path: PathBuf,
    query_max_tokens: u32,
    summary_max_tokens: u32,
    inference_timeout: Duration,
    execution_timeout: Duration,
}

impl QueryPipeline {
    pub fn new(gateway: Arc<dyn InferenceGateway>, database_path: PathBuf) -> Self {
        Self {
            gateway,
            database_path,
            query_max_tokens: 100,
            summary_max_tokens: 150,
            inference_timeout: Duration::from_secs(120),
            execution_timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(config: &Config, gateway: Arc<dyn InferenceGateway>) -> Self {
        Self::new(gateway, config.database_path())
            .with_token_budgets(config.query_max_tokens, config.summary_max_tokens)
            .with_timeouts(
                Duration::from_secs(config.inference_timeout_secs),
                Duration::from_secs(config.execution_timeout_secs),
            )
    }

    /// Query generation and summarization keep independent token budgets.
    pub fn with_token_budgets(mut self, query: u32, summary: u32) -> Self {
        self.query_max_tokens = query;
        self.summary_max_tokens = summary;
        self
    }

    pub fn with_timeouts(mut self, inference: Duration, execution: Duration) -> Self {
        self.inference_timeout = inference;
        self.execution_timeout = execution;
        self
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    /// Validate and persist an uploaded database file.
    ///
    /// The bytes go to a temporary sibling first and are renamed over the
    /// active path, so an in-flight `ask` never reads a partially written
    /// file; it sees either the old database or the new one.
    pub fn upload_database(&self, filename: &str, contents: &[u8]) -> Result<()> {
        if filename.is_empty() {
            return Err(PipelineError::Validation("No selected file".to_string()));
        }
        if !filename.ends_with(DATABASE_EXTENSION) {
            return Err(PipelineError::Validation("Invalid file type".to_string()));
        }

        if let Some(parent) = self.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let active_name = self
            .database_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| DATABASE_FILE_NAME.to_string());
        let temp_path = self
            .database_path
            .with_file_name(format!("{}.tmp-{}", active_name, Uuid::new_v4()));

        std::fs::write(&temp_path, contents)?;
        if let Err(e) = std::fs::rename(&temp_path, &self.database_path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e.into());
        }

        info!(
            path = %self.database_path.display(),
            bytes = contents.len(),
            "database uploaded"
        );
        Ok(())
    }

    /// Run the full question-to-answer pipeline against the active
    /// database, logging one structured entry per request.
    pub async fn ask(&self, question: &str) -> Result<AskResponse> {
        let started = Instant::now();
        let outcome = self.ask_inner(question).await;

        let mut entry = QueryLogEntry {
            timestamp: Utc::now(),
            request_id: Uuid::new_v4().to_string(),
            question: question.to_string(),
            sql_generated: None,
            rows_returned: None,
            execution_time_ms: started.elapsed().as_millis() as u64,
            success: outcome.is_ok(),
            error_message: outcome.as_ref().err().map(|e| e.to_string()),
        };
        if let Ok(ref response) = outcome {
            entry.sql_generated = Some(response.query.clone());
            entry.rows_returned = Some(response.result.len());
        }
        entry.emit();

        outcome
    }

    async fn ask_inner(&self, question: &str) -> Result<AskResponse> {
        if !self.database_path.exists() {
            return Err(PipelineError::NotReady);
        }
        if question.trim().is_empty() {
            return Err(PipelineError::Validation("No question provided".to_string()));
        }

        // Extracted fresh on every call so the prompt always reflects the
        // current active database. A file that is unreadable here (mid-
        // replacement, or not a SQLite container) is retryable by the
        // caller, not fatal.
        let schema = match extract_schema(&self.database_path) {
            Ok(schema) => schema,
            Err(PipelineError::Storage(reason)) => {
                warn!(%reason, "active database unreadable at ask time");
                return Err(PipelineError::NotReady);
            }
            Err(e) => return Err(e),
        };

        let prompt = QUERY_PROMPT.render(question, &schema);
        let raw = self.generate(&prompt, self.query_max_tokens).await?;
        let query = normalize_query(QUERY_PROMPT.extract_response(&raw));
        info!(%query, "generated query");

        let result = self.execute(&query).await?;

        let interpretation = timeout(
            self.inference_timeout,
            summarize::summarize(
                self.gateway.as_ref(),
                &result,
                question,
                self.summary_max_tokens,
            ),
        )
        .await
        .map_err(|_| PipelineError::Timeout("summarization", self.inference_timeout.as_secs()))??;

        Ok(AskResponse {
            query,
            result: result.to_records(),
            interpretation,
        })
    }

    async fn generate(&self, prompt: &str, max_new_tokens: u32) -> Result<String> {
        timeout(
            self.inference_timeout,
            self.gateway.generate(prompt, max_new_tokens),
        )
        .await
        .map_err(|_| PipelineError::Timeout("inference", self.inference_timeout.as_secs()))?
    }

    async fn execute(&self, query: &str) -> Result<QueryResult> {
        let query = query.to_string();
        let path = self.database_path.clone();
        let handle = tokio::task::spawn_blocking(move || executor::execute_query(&query, &path));

        let joined = timeout(self.execution_timeout, handle)
            .await
            .map_err(|_| PipelineError::Timeout("execution", self.execution_timeout.as_secs()))?;
        joined.map_err(|e| PipelineError::Execution(format!("execution task failed: {}", e)))?
    }
}
