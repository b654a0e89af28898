use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or validating a product catalog.
///
/// Every variant means the catalog could not be turned into a usable
/// snapshot. Callers treat these as internal failures: the request that
/// triggered a load cannot be served, but the user input was not at fault.
#[derive(Debug, Error)]
pub enum CatalogLoadError {
    /// The catalog file could not be opened or read.
    #[error("failed to read catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The file was read but is not the expected JSON shape.
    #[error("malformed catalog file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Paired product/embedding files do not have the same number of rows.
    #[error("catalog has {products} products but {embeddings} embeddings")]
    LengthMismatch { products: usize, embeddings: usize },
    /// Row `index` of the embeddings file belongs to a different image than
    /// row `index` of the products file.
    #[error(
        "catalog entry {index} pairs product image `{product_image}` with embedding image `{embedding_image}`"
    )]
    PairingMismatch {
        index: usize,
        product_image: String,
        embedding_image: String,
    },
    /// A stored vector has a different dimensionality than the first entry.
    #[error("catalog entry {index} has dimension {found}, expected {expected}")]
    InconsistentDimensions {
        index: usize,
        expected: usize,
        found: usize,
    },
    /// A stored vector has no components at all.
    #[error("catalog entry {index} has an empty embedding")]
    EmptyEmbedding { index: usize },
    /// A stored vector contains NaN or an infinity.
    #[error("catalog entry {index} has a non-finite embedding component")]
    NonFiniteComponent { index: usize },
}

impl CatalogLoadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CatalogLoadError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        CatalogLoadError::Parse {
            path: path.into(),
            source,
        }
    }
}
