use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use catalog::EmbeddingVector;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::{ApiProvider, EmbeddingConfig};
use crate::error::EmbeddingError;
use crate::input::ImageInput;
use crate::normalize::l2_normalize_in_place;
use crate::retry::{execute_with_retry, is_retryable_status, RetryConfig};
use crate::EmbeddingSource;

/// Longest slice of an error body kept in messages.
const MAX_ERROR_BODY: usize = 256;

/// Embeds images by calling a remote inference endpoint.
#[derive(Debug, Clone)]
pub struct HttpEmbeddingSource {
    client: reqwest::Client,
    url: String,
    auth_header: Option<String>,
    provider: ApiProvider,
    expected_dimension: Option<usize>,
    normalize: bool,
    max_image_bytes: usize,
    retry: RetryConfig,
}

enum Payload {
    Json(Value),
    Raw(Bytes),
}

impl HttpEmbeddingSource {
    pub fn from_config(cfg: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let url = cfg
            .api_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| EmbeddingError::Config("api_url is required for api mode".into()))?;

        let client = reqwest::Client::builder()
            .timeout(cfg.http_timeout)
            .connect_timeout(cfg.http_timeout.min(Duration::from_secs(5)))
            .pool_max_idle_per_host(16)
            .build()
            .map_err(|e| EmbeddingError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.to_string(),
            auth_header: cfg.api_auth_header.clone(),
            provider: cfg.api_provider,
            expected_dimension: cfg.expected_dimension,
            normalize: cfg.normalize,
            max_image_bytes: cfg.max_image_bytes,
            retry: cfg.retry,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.url
    }

    fn build_payload(&self, input: &ImageInput) -> Payload {
        match (self.provider, input) {
            (ApiProvider::HuggingFace, ImageInput::Url(url)) => Payload::Json(json!({ "inputs": url })),
            (ApiProvider::HuggingFace, ImageInput::Bytes(data)) => Payload::Raw(data.clone()),
            (ApiProvider::Custom, ImageInput::Url(url)) => Payload::Json(json!({ "image_url": url })),
            (ApiProvider::Custom, ImageInput::Bytes(data)) => {
                Payload::Json(json!({ "image_base64": STANDARD.encode(data) }))
            }
        }
    }

    async fn send(&self, payload: &Payload) -> Result<Value, EmbeddingError> {
        let mut request = self.client.post(&self.url);
        if let Some(header) = self.auth_header.as_deref() {
            request = request.header(AUTHORIZATION, header);
        }
        request = match payload {
            Payload::Json(body) => request.json(body),
            Payload::Raw(data) => request
                .header(CONTENT_TYPE, "application/octet-stream")
                .body(data.clone()),
        };

        let response = request.send().await.map_err(|e| {
            EmbeddingError::Unavailable(format!("HTTP request failed: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY).rev().find(|&i| body.is_char_boundary(i)).unwrap_or(0);
                body.truncate(cut);
            }
            let message = format!("HTTP {status}: {body}");
            return Err(if is_retryable_status(status.as_u16()) {
                EmbeddingError::Unavailable(message)
            } else {
                EmbeddingError::Rejected(message)
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(format!("body is not JSON: {e}")))
    }

    fn finish(&self, value: Value) -> Result<EmbeddingVector, EmbeddingError> {
        let mut vector = parse_single_embedding(value)?;
        if let Some(expected) = self.expected_dimension {
            if vector.len() != expected {
                return Err(EmbeddingError::InvalidResponse(format!(
                    "expected {expected} components, got {}",
                    vector.len()
                )));
            }
        }
        if self.normalize {
            l2_normalize_in_place(&mut vector);
        }
        Ok(EmbeddingVector::new(vector))
    }
}

#[async_trait]
impl EmbeddingSource for HttpEmbeddingSource {
    async fn embed(&self, input: &ImageInput) -> Result<EmbeddingVector, EmbeddingError> {
        input.validate(self.max_image_bytes)?;
        let payload = self.build_payload(input);

        let this = self;
        let payload = &payload;
        let outcome = execute_with_retry(&self.retry, move |_| this.send(payload)).await;

        match outcome.result {
            Ok(value) => {
                tracing::debug!(
                    endpoint = %self.url,
                    attempts = outcome.attempts,
                    elapsed_ms = outcome.elapsed.as_millis() as u64,
                    "embedding received"
                );
                self.finish(value)
            }
            Err(err) => {
                tracing::warn!(
                    endpoint = %self.url,
                    attempts = outcome.attempts,
                    error = %err,
                    "embedding request failed"
                );
                Err(err)
            }
        }
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Extract exactly one embedding from a service response.
///
/// Accepted shapes: `[..]`, `[[..]]`, `{"embedding": [..]}`,
/// `{"embeddings": [[..]]}` and `{"data": [{"embedding": [..]}]}`. Multiple
/// vectors are rejected rather than silently picking one.
pub fn parse_single_embedding(value: Value) -> Result<Vec<f32>, EmbeddingError> {
    let mut vectors = parse_embeddings_from_value(value)?;
    if vectors.len() != 1 {
        return Err(EmbeddingError::InvalidResponse(format!(
            "expected exactly one embedding, got {}",
            vectors.len()
        )));
    }
    let vector = vectors.pop().unwrap_or_default();
    if vector.is_empty() {
        return Err(EmbeddingError::InvalidResponse("embedding is empty".into()));
    }
    Ok(vector)
}

fn parse_embeddings_from_value(value: Value) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    match value {
        Value::Object(mut map) => {
            if let Some(embedding) = map.remove("embedding") {
                return parse_embedding_vector(embedding).map(|v| vec![v]);
            }
            if let Some(embeddings) = map.remove("embeddings") {
                return parse_embedding_collection(embeddings);
            }
            if let Some(Value::Array(items)) = map.remove("data") {
                return items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(mut obj) => obj
                            .remove("embedding")
                            .ok_or_else(|| {
                                EmbeddingError::InvalidResponse("missing `embedding` field in data item".into())
                            })
                            .and_then(parse_embedding_vector),
                        _ => Err(EmbeddingError::InvalidResponse(
                            "unexpected entry inside `data` array".into(),
                        )),
                    })
                    .collect();
            }
            if let Some(Value::String(message)) = map.remove("error") {
                return Err(EmbeddingError::InvalidResponse(format!("service reported: {message}")));
            }
            Err(EmbeddingError::InvalidResponse("unsupported response shape".into()))
        }
        other => parse_embedding_collection(other),
    }
}

fn parse_embedding_collection(value: Value) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    match value {
        Value::Array(items) if items.is_empty() => Ok(Vec::new()),
        Value::Array(items) if items.iter().all(Value::is_array) => {
            items.into_iter().map(parse_embedding_vector).collect()
        }
        other => parse_embedding_vector(other).map(|v| vec![v]),
    }
}

fn parse_embedding_vector(value: Value) -> Result<Vec<f32>, EmbeddingError> {
    match value {
        Value::Array(values) => values
            .into_iter()
            .map(|entry| match entry {
                Value::Number(num) => num
                    .as_f64()
                    .map(|f| f as f32)
                    .filter(|f| f.is_finite())
                    .ok_or_else(|| EmbeddingError::InvalidResponse("non-finite embedding value".into())),
                other => Err(EmbeddingError::InvalidResponse(format!(
                    "embedding entries must be numbers, got {other}"
                ))),
            })
            .collect(),
        other => Err(EmbeddingError::InvalidResponse(format!(
            "embedding must be an array, got {other}"
        ))),
    }
}
