use thiserror::Error;

/// Contract violations in the chunk splitter configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChunkError {
    #[error("chunk_size must be greater than zero")]
    ZeroChunkSize,
    #[error("chunk_overlap ({overlap}) must be smaller than chunk_size ({chunk_size})")]
    OverlapTooLarge { overlap: usize, chunk_size: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid config value at {path}: {message}")]
    Invalid { path: String, message: String },
}

impl ConfigError {
    pub fn invalid(path: &str, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

/// Failures reported by the vector-search collaborator.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The backend cannot attach scores to its results.
    #[error("similarity scores are not available from this backend")]
    ScoresUnavailable,
    #[error("vector search failed: {0}")]
    Backend(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SearchParamsError {
    #[error("query cannot be empty")]
    EmptyQuery,
    #[error("k must be between 1 and {max}, got {value}")]
    KOutOfRange { value: usize, max: usize },
    #[error("min_score must be between 0 and 1, got {0}")]
    MinScoreOutOfRange(f64),
}

/// Errors surfaced by the retrieval entry point.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error(transparent)]
    Params(#[from] SearchParamsError),
    #[error(transparent)]
    Search(#[from] SearchError),
}

/// Failures reported by the chunk storage collaborator.
#[derive(Debug, Error)]
#[error("chunk sink rejected batch: {0}")]
pub struct SinkError(pub String);

impl SinkError {
    pub fn new<E: std::fmt::Display>(err: E) -> Self {
        SinkError(err.to_string())
    }
}
