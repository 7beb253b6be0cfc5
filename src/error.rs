use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Malformed upload or ask input. The payload text is part of the wire
    /// contract ("No file part", "No selected file", "Invalid file type"),
    /// so it is displayed verbatim.
    #[error("{0}")]
    Validation(String),

    /// Ask attempted without an active database, or the active database
    /// was unreadable at read time. Retryable by the caller.
    #[error("No database uploaded yet")]
    NotReady,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("{0} timed out after {1}s")]
    Timeout(&'static str, u64),

    /// Generated SQL failed against the live schema. Carries the engine's
    /// message verbatim; callers report it as data, not as a fault.
    #[error("{0}")]
    Execution(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
