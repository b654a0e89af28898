//! API route handlers
//!
//! - `health`: liveness, readiness and Prometheus metrics
//! - `matching`: image and vector queries against the catalog
//! - `catalog`: catalog stats and hot reload

pub mod catalog;
pub mod health;
pub mod matching;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// API version and base info
///
/// ```json
/// {
///   "name": "vismatch",
///   "version": "0.1.0",
///   "api_version": "v1",
///   "endpoints": ["..."]
/// }
/// ```
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "vismatch",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
        "endpoints": [
            "POST /api/v1/match",
            "POST /api/v1/match/upload",
            "POST /api/v1/rank",
            "POST /api/v1/catalog/reload",
            "GET /api/v1/catalog/stats",
            "GET /health",
            "GET /ready",
            "GET /metrics"
        ]
    })))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
