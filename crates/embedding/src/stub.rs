use async_trait::async_trait;
use catalog::EmbeddingVector;
use fxhash::hash64;

use crate::error::EmbeddingError;
use crate::input::{ImageInput, DEFAULT_MAX_IMAGE_BYTES};
use crate::normalize::l2_normalize_in_place;
use crate::EmbeddingSource;

/// Deterministic embedder: sinusoids seeded from an fxhash of the input.
///
/// The same bytes (or URL) always map to the same vector, which makes it
/// handy for local runs without an inference service and for tests.
#[derive(Debug, Clone)]
pub struct StubEmbeddingSource {
    dimension: usize,
    normalize: bool,
    max_image_bytes: usize,
}

impl StubEmbeddingSource {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            normalize: true,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }

    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn with_max_image_bytes(mut self, max: usize) -> Self {
        self.max_image_bytes = max;
        self
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn vector_for(&self, seed: &[u8]) -> Vec<f32> {
        let h = hash64(seed);
        let mut v: Vec<f32> = (0..self.dimension)
            .map(|idx| {
                let phase = ((h >> (idx % 48)) & 0xFFFF) as f32 * 0.0001;
                (phase + idx as f32).sin()
            })
            .collect();
        if self.normalize {
            l2_normalize_in_place(&mut v);
        }
        v
    }
}

#[async_trait]
impl EmbeddingSource for StubEmbeddingSource {
    async fn embed(&self, input: &ImageInput) -> Result<EmbeddingVector, EmbeddingError> {
        input.validate(self.max_image_bytes)?;
        let seed: &[u8] = match input {
            ImageInput::Bytes(data) => data.as_ref(),
            ImageInput::Url(url) => url.trim().as_bytes(),
        };
        Ok(EmbeddingVector::new(self.vector_for(seed)))
    }

    fn name(&self) -> &str {
        "stub"
    }
}
