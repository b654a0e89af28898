use thiserror::Error;

/// Reasons a ranking call is rejected.
///
/// All variants describe a bad request (or a request against an empty
/// catalog); none of them is retryable and no partial result accompanies
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RankError {
    /// The query does not have the catalog's dimensionality.
    #[error("query has dimension {query}, catalog has dimension {catalog}")]
    DimensionMismatch { query: usize, catalog: usize },
    /// There is nothing to rank against.
    #[error("catalog is empty")]
    EmptyCatalog,
    /// The requested result count is below one.
    #[error("result limit must be at least 1, got {0}")]
    InvalidLimit(usize),
    /// The query has zero length, so cosine similarity is undefined.
    #[error("query vector has zero norm")]
    ZeroQuery,
    /// The query is empty or carries NaN/infinite components.
    #[error("invalid query vector: {0}")]
    InvalidQuery(String),
}
