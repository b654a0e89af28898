use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use vismatch::ImageInput;

/// Match request: exactly one of `image_url` or `image_base64`.
#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    /// Public http(s) URL of the query image
    #[serde(default)]
    pub image_url: Option<String>,

    /// Image bytes, base64 encoded; a `data:` URL prefix is accepted
    #[serde(default)]
    pub image_base64: Option<String>,

    /// Maximum results to return (server default when omitted)
    #[serde(default)]
    pub limit: Option<usize>,
}

impl MatchRequest {
    fn image(&self) -> ServerResult<ImageInput> {
        match (&self.image_url, &self.image_base64) {
            (Some(url), None) => Ok(ImageInput::url(url.trim())),
            (None, Some(encoded)) => {
                ImageInput::from_base64(encoded).map_err(|err| ServerError::Match(err.into()))
            }
            (None, None) => Err(ServerError::BadRequest(
                "missing image: provide image_url or image_base64".into(),
            )),
            (Some(_), Some(_)) => Err(ServerError::BadRequest(
                "provide only one of image_url or image_base64".into(),
            )),
        }
    }
}

/// Rank request for a precomputed query embedding.
#[derive(Debug, Deserialize)]
pub struct RankRequest {
    pub vector: Vec<f32>,

    #[serde(default)]
    pub limit: Option<usize>,
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> ServerResult<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ServerError::BadRequest(rejection.body_text()))
}

/// Embed the query image and rank the catalog against it.
///
/// The response never applies a score threshold; display filtering is
/// left to the client.
pub async fn match_image(
    State(state): State<Arc<ServerState>>,
    body: Result<Json<MatchRequest>, JsonRejection>,
) -> ServerResult<impl IntoResponse> {
    let request = json_body(body)?;
    let image = request.image()?;

    let outcome = state.matcher.match_image(&image, request.limit).await?;
    tracing::debug!(
        source = "json",
        total = outcome.total,
        catalog_version = outcome.catalog_version,
        "match served"
    );
    Ok(Json(outcome))
}

/// Multipart upload: an `image` file field and an optional `limit` field.
pub async fn match_upload(
    State(state): State<Arc<ServerState>>,
    mut multipart: Multipart,
) -> ServerResult<impl IntoResponse> {
    let mut image = None;
    let mut limit = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| upload_error(&state, e))? {
        match field.name() {
            Some("image") => {
                let data = field.bytes().await.map_err(|e| upload_error(&state, e))?;
                image = Some(ImageInput::bytes(data));
            }
            Some("limit") => {
                let text = field.text().await.map_err(|e| upload_error(&state, e))?;
                let parsed = text.trim().parse::<usize>().map_err(|_| {
                    ServerError::BadRequest(format!("limit must be a non-negative integer, got {text:?}"))
                })?;
                limit = Some(parsed);
            }
            _ => {}
        }
    }

    let image = image.ok_or_else(|| ServerError::BadRequest("missing multipart field 'image'".into()))?;
    let outcome = state.matcher.match_image(&image, limit).await?;
    tracing::debug!(
        source = "upload",
        total = outcome.total,
        catalog_version = outcome.catalog_version,
        "match served"
    );
    Ok(Json(outcome))
}

fn upload_error(state: &ServerState, err: MultipartError) -> ServerError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge(state.config.max_body_size_mb)
    } else {
        ServerError::BadRequest(err.body_text())
    }
}

/// Rank the catalog against a caller-supplied embedding; no embedding call.
pub async fn rank_vector(
    State(state): State<Arc<ServerState>>,
    body: Result<Json<RankRequest>, JsonRejection>,
) -> ServerResult<impl IntoResponse> {
    let request = json_body(body)?;
    let outcome = state.matcher.rank_vector(&request.vector, request.limit)?;
    Ok(Json(outcome))
}
