//! Runtime configuration from environment variables.

use std::path::PathBuf;
use std::str::FromStr;

/// Fixed well-known name of the active database file.
pub const DATABASE_FILE_NAME: &str = "uploaded_database.db";

/// Accepted extension for uploaded database files.
pub const DATABASE_EXTENSION: &str = ".db";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: PathBuf,
    pub inference_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub llm_stub: bool,
    pub query_max_tokens: u32,
    pub summary_max_tokens: u32,
    pub inference_timeout_secs: u64,
    pub execution_timeout_secs: u64,
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load configuration from the environment, falling back to defaults
    /// for anything unset or unparseable.
    pub fn from_env() -> Self {
        Self {
            port: env_parsed("ASKDB_PORT", 8080),
            data_dir: PathBuf::from(env_or("ASKDB_DATA_DIR", ".")),
            inference_url: env_or("LLM_BASE_URL", "http://localhost:8000/v1"),
            model: env_or("LLM_MODEL", "codellama/CodeLlama-34b-hf"),
            api_key: std::env::var("LLM_API_KEY").ok(),
            llm_stub: env_flag("LLM_STUB"),
            query_max_tokens: env_parsed("ASKDB_QUERY_MAX_TOKENS", 100),
            summary_max_tokens: env_parsed("ASKDB_SUMMARY_MAX_TOKENS", 150),
            inference_timeout_secs: env_parsed("ASKDB_INFERENCE_TIMEOUT_SECS", 120),
            execution_timeout_secs: env_parsed("ASKDB_EXECUTION_TIMEOUT_SECS", 30),
            max_upload_bytes: env_parsed("ASKDB_MAX_UPLOAD_BYTES", 64 * 1024 * 1024),
        }
    }

    /// Full path of the active database slot.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE_NAME)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
