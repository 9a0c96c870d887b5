use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Remote embedding call failed (network, auth, rate limit, bad payload).
    /// `status` is the HTTP status when the service answered at all.
    #[error("Embedding service error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    EmbeddingService { status: Option<u16>, message: String },

    #[error("Embedding dimension mismatch: got {got} expected {expected}")]
    DimensionMismatch { got: usize, expected: usize },

    #[error("Store write failed: {0}")]
    StoreWrite(String),

    #[error("Store query failed: {0}")]
    StoreQuery(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl Error {
    pub fn embedding<S: Into<String>>(message: S) -> Self {
        Self::EmbeddingService { status: None, message: message.into() }
    }

    /// True for errors a caller may reasonably retry (transport, 429, 5xx).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::EmbeddingService { status: None, .. } => true,
            Self::EmbeddingService { status: Some(s), .. } => *s == 429 || *s >= 500,
            Self::Timeout(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
