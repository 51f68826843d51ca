use std::path::PathBuf;

/// Failures that must stop a session before its first query.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("GEMINI_API_KEY must be set (or pass --api-key)")]
    MissingApiKey,

    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV dataset: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed JSON dataset: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported dataset format for {path} (expected .csv or .json)")]
    UnsupportedFormat { path: PathBuf },

    #[error("row {line}: field `{field}` {reason}")]
    InvalidRow {
        line: usize,
        field: &'static str,
        reason: String,
    },
}
