use thiserror::Error;

/// Errors surfaced by an [`EmbeddingSource`](crate::EmbeddingSource).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmbeddingError {
    /// The inference service could not be reached, answered with a transient
    /// error status, or did not answer in time.
    #[error("embedding source unavailable: {0}")]
    Unavailable(String),
    /// The service refused the request with a non-retryable status
    /// (bad credentials, unsupported image, ...).
    #[error("embedding source rejected the request: {0}")]
    Rejected(String),
    /// The service answered, but not with a single flat numeric vector of the
    /// expected dimensionality.
    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),
    /// The image reference was rejected before any call was made.
    #[error("invalid image input: {0}")]
    InvalidInput(String),
    /// Configuration is inconsistent (e.g. api mode without an endpoint).
    #[error("invalid embedding config: {0}")]
    Config(String),
}

impl EmbeddingError {
    /// Whether a caller may reasonably try the same request again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EmbeddingError::Unavailable(_))
    }
}
