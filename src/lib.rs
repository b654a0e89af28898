//! Workspace umbrella crate for vismatch, a visual product matcher.
//!
//! Given a query image, [`VisualMatcher`] obtains its embedding from an
//! [`EmbeddingSource`], ranks every catalog product by cosine similarity and
//! returns the best matches. Filtering by a minimum score is left to the
//! caller ([`filter_by_score`], [`DisplayThreshold`]).
//!
//! ```no_run
//! use vismatch::{ImageInput, PipelineConfig, VisualMatcher};
//!
//! # async fn run() -> Result<(), vismatch::MatchError> {
//! let matcher = VisualMatcher::from_config(PipelineConfig::default())?;
//! let outcome = matcher
//!     .match_image(&ImageInput::url("https://cdn.example.com/red_shoe.jpg"), Some(5))
//!     .await?;
//! for hit in vismatch::filter_by_score(&outcome.results, 0.8) {
//!     println!("{:.3} {}", hit.score(), hit.product().name);
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod metrics;
mod pipeline;

pub use crate::config::PipelineConfig;
pub use crate::error::{ErrorKind, MatchError};
pub use crate::metrics::{set_pipeline_metrics, PipelineMetrics};
pub use crate::pipeline::{MatchOutcome, VisualMatcher};

pub use catalog::{
    Catalog, CatalogEntry, CatalogLoadError, CatalogSnapshot, CatalogSource, CatalogStore,
    EmbeddingVector, ProductRecord,
};
pub use embedding::{
    embed_with_timeout, source_from_config, ApiProvider, EmbeddingConfig, EmbeddingError,
    EmbeddingMode, EmbeddingSource, HttpEmbeddingSource, ImageInput, RetryConfig,
    StubEmbeddingSource,
};
pub use ranker::{
    cosine_similarity, filter_by_score, rank, retain_by_score, DisplayThreshold, RankError,
    RankingRequest, ScoredResult, DEFAULT_LIMIT,
};
