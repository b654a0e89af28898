use std::fmt;

use catalog::CatalogLoadError;
use embedding::EmbeddingError;
use ranker::RankError;
use serde::Serialize;
use thiserror::Error;

/// Coarse failure class used for status mapping, metrics labels and alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad request shape or contents. Never retried.
    Validation,
    /// Embedding source unreachable, slow or malformed. Callers may retry.
    Upstream,
    /// Bad catalog data that is recovered from locally; never fails a request.
    DataQuality,
    /// Catalog unusable or misconfigured process. Fatal to the request.
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Upstream => "upstream",
            ErrorKind::DataQuality => "data_quality",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by [`VisualMatcher`](crate::VisualMatcher).
#[derive(Debug, Error)]
pub enum MatchError {
    #[error(transparent)]
    Rank(#[from] RankError),
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    #[error("catalog unavailable: {0}")]
    Catalog(#[from] CatalogLoadError),
    #[error("result limit {requested} exceeds the maximum of {max}")]
    LimitTooLarge { requested: usize, max: usize },
    #[error("invalid pipeline config: {0}")]
    Config(String),
}

impl MatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MatchError::Rank(RankError::EmptyCatalog) => ErrorKind::Internal,
            MatchError::Rank(_) => ErrorKind::Validation,
            MatchError::Embedding(EmbeddingError::InvalidInput(_)) => ErrorKind::Validation,
            MatchError::Embedding(EmbeddingError::Config(_)) => ErrorKind::Internal,
            MatchError::Embedding(_) => ErrorKind::Upstream,
            MatchError::Catalog(_) | MatchError::Config(_) => ErrorKind::Internal,
            MatchError::LimitTooLarge { .. } => ErrorKind::Validation,
        }
    }

    /// Stable machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            MatchError::Rank(RankError::DimensionMismatch { .. }) => "DIMENSION_MISMATCH",
            MatchError::Rank(RankError::EmptyCatalog) => "EMPTY_CATALOG",
            MatchError::Rank(RankError::InvalidLimit(_)) | MatchError::LimitTooLarge { .. } => {
                "INVALID_LIMIT"
            }
            MatchError::Rank(RankError::ZeroQuery) => "ZERO_QUERY",
            MatchError::Rank(RankError::InvalidQuery(_)) => "INVALID_QUERY",
            MatchError::Embedding(EmbeddingError::InvalidInput(_)) => "INVALID_IMAGE",
            MatchError::Embedding(EmbeddingError::InvalidResponse(_)) => "INVALID_EMBEDDING_RESPONSE",
            MatchError::Embedding(EmbeddingError::Config(_)) | MatchError::Config(_) => "CONFIG_ERROR",
            MatchError::Embedding(_) => "EMBEDDING_UNAVAILABLE",
            MatchError::Catalog(_) => "CATALOG_ERROR",
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Upstream
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_errors_are_validation_except_empty_catalog() {
        let mismatch: MatchError = RankError::DimensionMismatch { query: 512, catalog: 768 }.into();
        assert_eq!(mismatch.kind(), ErrorKind::Validation);
        assert_eq!(mismatch.code(), "DIMENSION_MISMATCH");
        assert_eq!(mismatch.to_string(), "query has dimension 512, catalog has dimension 768");

        let empty: MatchError = RankError::EmptyCatalog.into();
        assert_eq!(empty.kind(), ErrorKind::Internal);
        assert!(!empty.is_retryable());
    }

    #[test]
    fn embedding_errors_split_by_cause() {
        let unavailable: MatchError = EmbeddingError::Unavailable("timeout".into()).into();
        assert_eq!(unavailable.kind(), ErrorKind::Upstream);
        assert!(unavailable.is_retryable());
        assert_eq!(unavailable.code(), "EMBEDDING_UNAVAILABLE");

        let malformed: MatchError = EmbeddingError::InvalidResponse("[[1],[2]]".into()).into();
        assert_eq!(malformed.kind(), ErrorKind::Upstream);

        let bad_input: MatchError = EmbeddingError::InvalidInput("empty".into()).into();
        assert_eq!(bad_input.kind(), ErrorKind::Validation);
        assert_eq!(bad_input.code(), "INVALID_IMAGE");
    }

    #[test]
    fn catalog_errors_are_internal() {
        let err: MatchError = CatalogLoadError::LengthMismatch { products: 3, embeddings: 2 }.into();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.code(), "CATALOG_ERROR");
    }

    #[test]
    fn kind_labels() {
        assert_eq!(ErrorKind::DataQuality.to_string(), "data_quality");
        assert_eq!(serde_json::to_value(ErrorKind::Upstream).unwrap(), "upstream");
    }
}
