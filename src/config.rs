use std::time::Duration;

use catalog::CatalogSource;
use embedding::EmbeddingConfig;
use serde::{Deserialize, Serialize};

use crate::error::MatchError;

/// End-to-end settings for a [`VisualMatcher`](crate::VisualMatcher).
///
/// Nested under `pipeline` in the server config:
///
/// ```toml
/// [pipeline]
/// default_limit = 10
/// max_limit = 100
/// embed_timeout_ms = 10000
///
/// [pipeline.catalog]
/// format = "paired"
/// products = "data/products.json"
/// embeddings = "data/embeddings.json"
///
/// [pipeline.embedding]
/// mode = "api"
/// api_url = "https://router.huggingface.co/hf-inference/models/openai/clip-vit-base-patch32"
/// expected_dimension = 512
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Results returned when a request does not name a limit.
    pub default_limit: usize,
    /// Largest limit a request may ask for.
    pub max_limit: usize,
    /// Deadline for one embedding call, retries included.
    pub embed_timeout_ms: u64,
    pub catalog: CatalogSource,
    pub embedding: EmbeddingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_limit: ranker::DEFAULT_LIMIT,
            max_limit: 100,
            embed_timeout_ms: 10_000,
            catalog: CatalogSource::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn embed_timeout(&self) -> Duration {
        Duration::from_millis(self.embed_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if self.default_limit == 0 {
            return Err(MatchError::Config("default_limit must be at least 1".into()));
        }
        if self.max_limit < self.default_limit {
            return Err(MatchError::Config(format!(
                "max_limit ({}) must not be below default_limit ({})",
                self.max_limit, self.default_limit
            )));
        }
        if self.embed_timeout_ms == 0 {
            return Err(MatchError::Config("embed_timeout_ms must be positive".into()));
        }
        self.embedding.validate()?;
        Ok(())
    }
}
