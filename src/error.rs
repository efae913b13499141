use std::path::PathBuf;

/// Errors surfaced by the analytics library.
///
/// Missing or malformed optional fields never end up here; they degrade to
/// defaults during normalization. Only a structurally invalid input collection
/// or an unreadable configuration fails a run.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    /// The input was not an array of issue records.
    #[error("invalid issue collection: {0}")]
    InvalidInput(String),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
