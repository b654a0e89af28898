//! # vismatch embedding (`embedding`)
//!
//! Turns a query image into an [`EmbeddingVector`] comparable with the
//! catalog. The model itself is a black box behind [`EmbeddingSource`]:
//!
//! - [`HttpEmbeddingSource`] calls a remote inference endpoint (Hugging Face
//!   feature-extraction or a custom JSON service), retrying transient
//!   failures with exponential backoff.
//! - [`StubEmbeddingSource`] derives a deterministic vector from a hash of
//!   the input. No network, no model; good for local runs and tests.
//!
//! Callers bound the wait with [`embed_with_timeout`]; an expired deadline is
//! reported as [`EmbeddingError::Unavailable`] like any other upstream failure.
//!
//! ```
//! use embedding::{embed_with_timeout, source_from_config, EmbeddingConfig, ImageInput};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let source = source_from_config(&EmbeddingConfig::stub(512)).unwrap();
//! let input = ImageInput::url("https://cdn.example.com/red_shoe.jpg");
//! let vector = embed_with_timeout(source.as_ref(), &input, Duration::from_secs(1))
//!     .await
//!     .unwrap();
//! assert_eq!(vector.dimension(), 512);
//! # }
//! ```

pub mod config;
pub mod error;
pub mod input;
pub mod retry;
mod serde_millis;

mod api;
mod normalize;
mod stub;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub use catalog::EmbeddingVector;

pub use crate::api::{parse_single_embedding, HttpEmbeddingSource};
pub use crate::config::{ApiProvider, EmbeddingConfig, EmbeddingMode};
pub use crate::error::EmbeddingError;
pub use crate::input::{ImageInput, DEFAULT_MAX_IMAGE_BYTES};
pub use crate::retry::RetryConfig;
pub use crate::stub::StubEmbeddingSource;

/// Produces the embedding of a query image.
///
/// Implementations must be safe to share across request tasks.
#[async_trait]
pub trait EmbeddingSource: Send + Sync {
    async fn embed(&self, input: &ImageInput) -> Result<EmbeddingVector, EmbeddingError>;

    /// Short backend label for logs.
    fn name(&self) -> &str {
        "embedding"
    }
}

#[async_trait]
impl<T: EmbeddingSource + ?Sized> EmbeddingSource for Arc<T> {
    async fn embed(&self, input: &ImageInput) -> Result<EmbeddingVector, EmbeddingError> {
        (**self).embed(input).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Run `source.embed(input)` with a deadline.
pub async fn embed_with_timeout(
    source: &dyn EmbeddingSource,
    input: &ImageInput,
    timeout: Duration,
) -> Result<EmbeddingVector, EmbeddingError> {
    match tokio::time::timeout(timeout, source.embed(input)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                source = source.name(),
                timeout_ms = timeout.as_millis() as u64,
                "embedding source timed out"
            );
            Err(EmbeddingError::Unavailable(format!(
                "no embedding within {}ms",
                timeout.as_millis()
            )))
        }
    }
}

/// Build the backend selected by `cfg.mode`.
pub fn source_from_config(cfg: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingSource>, EmbeddingError> {
    cfg.validate()?;
    Ok(match cfg.mode {
        EmbeddingMode::Api => Arc::new(HttpEmbeddingSource::from_config(cfg)?),
        EmbeddingMode::Stub => Arc::new(
            StubEmbeddingSource::new(cfg.stub_dimension)
                .with_normalize(cfg.normalize)
                .with_max_image_bytes(cfg.max_image_bytes),
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Slow;

    #[async_trait]
    impl EmbeddingSource for Slow {
        async fn embed(&self, _input: &ImageInput) -> Result<EmbeddingVector, EmbeddingError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(EmbeddingVector::new(vec![1.0]))
        }
    }

    #[tokio::test]
    async fn timeout_maps_to_unavailable() {
        let err = embed_with_timeout(&Slow, &ImageInput::url("https://x.io/a.jpg"), Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, EmbeddingError::Unavailable(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn fast_source_passes_through() {
        let stub = StubEmbeddingSource::new(16);
        let v = embed_with_timeout(&stub, &ImageInput::bytes(vec![7u8; 8]), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(v.dimension(), 16);
    }

    #[tokio::test]
    async fn arc_sources_delegate() {
        let source: Arc<dyn EmbeddingSource> = Arc::new(StubEmbeddingSource::new(4));
        assert_eq!(source.name(), "stub");
        assert_eq!(source.embed(&ImageInput::url("https://x.io/a.jpg")).await.unwrap().dimension(), 4);
    }

    #[test]
    fn config_selects_backend() {
        assert_eq!(source_from_config(&EmbeddingConfig::stub(8)).unwrap().name(), "stub");

        let cfg = EmbeddingConfig {
            api_url: Some("https://api.example.com/embed".into()),
            ..Default::default()
        };
        assert_eq!(source_from_config(&cfg).unwrap().name(), "http");

        assert!(source_from_config(&EmbeddingConfig::default()).is_err());
    }
}
