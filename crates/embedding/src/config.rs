use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::EmbeddingError;
use crate::input::DEFAULT_MAX_IMAGE_BYTES;
use crate::retry::RetryConfig;

/// Which backend produces query embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingMode {
    /// Remote HTTP inference service.
    #[default]
    Api,
    /// Deterministic hash-derived vectors, for development and tests.
    Stub,
}

/// Request/response dialect of the inference service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiProvider {
    /// Hugging Face feature-extraction: `{"inputs": url}` or a raw image body.
    #[default]
    #[serde(alias = "hf")]
    HuggingFace,
    /// `{"image_url": ..}` or `{"image_base64": ..}` JSON bodies.
    Custom,
}

/// Settings for building an [`EmbeddingSource`](crate::EmbeddingSource).
///
/// ```
/// use embedding::{EmbeddingConfig, EmbeddingMode};
///
/// let cfg = EmbeddingConfig {
///     mode: EmbeddingMode::Api,
///     api_url: Some("https://router.huggingface.co/hf-inference/models/openai/clip-vit-base-patch32".into()),
///     api_auth_header: Some("Bearer hf_xxx".into()),
///     expected_dimension: Some(512),
///     ..Default::default()
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub mode: EmbeddingMode,
    /// Inference endpoint; required in api mode.
    pub api_url: Option<String>,
    /// Full `Authorization` header value, e.g. `"Bearer hf_xxx"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_auth_header: Option<String>,
    pub api_provider: ApiProvider,
    /// Per-attempt HTTP timeout.
    #[serde(with = "crate::serde_millis")]
    pub http_timeout: Duration,
    /// Reject vectors of any other length.
    pub expected_dimension: Option<usize>,
    /// Scale returned vectors to unit length.
    pub normalize: bool,
    pub max_image_bytes: usize,
    pub retry: RetryConfig,
    /// Vector length produced in stub mode.
    pub stub_dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            mode: EmbeddingMode::Api,
            api_url: None,
            api_auth_header: None,
            api_provider: ApiProvider::HuggingFace,
            http_timeout: Duration::from_secs(8),
            expected_dimension: None,
            normalize: true,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            retry: RetryConfig::default(),
            stub_dimension: 512,
        }
    }
}

impl EmbeddingConfig {
    /// Stub-mode config producing `dimension`-long vectors.
    pub fn stub(dimension: usize) -> Self {
        Self {
            mode: EmbeddingMode::Stub,
            stub_dimension: dimension,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if self.max_image_bytes == 0 {
            return Err(EmbeddingError::Config("max_image_bytes must be positive".into()));
        }
        if self.expected_dimension == Some(0) {
            return Err(EmbeddingError::Config("expected_dimension must be positive".into()));
        }
        match self.mode {
            EmbeddingMode::Api => {
                let url = self.api_url.as_deref().unwrap_or("").trim();
                if url.is_empty() {
                    return Err(EmbeddingError::Config("api_url is required in api mode".into()));
                }
                reqwest::Url::parse(url)
                    .map_err(|e| EmbeddingError::Config(format!("api_url is not a valid URL: {e}")))?;
                if self.http_timeout.is_zero() {
                    return Err(EmbeddingError::Config("http_timeout must be positive".into()));
                }
            }
            EmbeddingMode::Stub => {
                if self.stub_dimension == 0 {
                    return Err(EmbeddingError::Config("stub_dimension must be positive".into()));
                }
                if let Some(expected) = self.expected_dimension {
                    if expected != self.stub_dimension {
                        return Err(EmbeddingError::Config(format!(
                            "stub_dimension {} does not match expected_dimension {expected}",
                            self.stub_dimension
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}
