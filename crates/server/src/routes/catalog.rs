use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use vismatch::CatalogSnapshot;

/// Catalog snapshot summary
#[derive(Debug, Serialize)]
pub struct CatalogStats {
    pub version: u64,
    pub entries: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,
    pub zero_norm_entries: usize,
    pub loaded_at: DateTime<Utc>,
}

impl From<&CatalogSnapshot> for CatalogStats {
    fn from(snapshot: &CatalogSnapshot) -> Self {
        Self {
            version: snapshot.version(),
            entries: snapshot.len(),
            dimension: snapshot.dimension(),
            zero_norm_entries: snapshot.zero_norm_entries(),
            loaded_at: snapshot.loaded_at(),
        }
    }
}

/// Current catalog version, size and data-quality counters.
pub async fn catalog_stats(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let snapshot = state.matcher.store().snapshot();
    Json(CatalogStats::from(snapshot.as_ref()))
}

/// Re-read the configured catalog files and swap them in.
///
/// In-flight requests finish on the snapshot they started with. A failed
/// reload leaves the current catalog in place and returns 500.
pub async fn reload_catalog(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    let matcher = Arc::clone(&state.matcher);
    let snapshot = tokio::task::spawn_blocking(move || matcher.reload_catalog())
        .await
        .map_err(|e| ServerError::Internal(format!("catalog reload task failed: {e}")))??;

    tracing::info!(
        catalog_version = snapshot.version(),
        entries = snapshot.len(),
        "catalog reloaded"
    );
    Ok(Json(CatalogStats::from(snapshot.as_ref())))
}
