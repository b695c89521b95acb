use thiserror::Error;

#[derive(Debug, Error)]
pub enum DangleError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("DNS error: {0}")]
    Dns(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("External tool failed: {0}")]
    Tool(String),

    #[error("External tool unavailable: {0}")]
    ToolUnavailable(String),

    /// Every call for one chunk of a phase failed, retries included.
    #[error("Batch {chunk} failed during {phase}: {reason}")]
    PartialBatch {
        phase: String,
        chunk: usize,
        reason: String,
    },

    #[error("Scan cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
