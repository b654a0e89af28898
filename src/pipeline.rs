use std::sync::Arc;

use catalog::{CatalogSnapshot, CatalogStore};
use embedding::{
    embed_with_timeout, source_from_config, EmbeddingError, EmbeddingSource, EmbeddingVector,
    ImageInput,
};
use ranker::{rank, RankError, ScoredResult};
use serde::Serialize;

use crate::config::PipelineConfig;
use crate::error::MatchError;
use crate::metrics::MetricsSpan;

/// Ranked products for one query, tagged with the catalog snapshot used.
#[derive(Debug, Clone, Serialize)]
pub struct MatchOutcome {
    /// The query image reference (URLs only; uploads are not echoed back).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_image: Option<String>,
    pub catalog_version: u64,
    pub total: usize,
    pub results: Vec<ScoredResult>,
}

/// Embeds a query image and ranks the current catalog against it.
///
/// Cheap to share: the catalog lives behind a [`CatalogStore`] and the
/// embedding backend behind an `Arc`. Each call pins one catalog snapshot, so
/// a concurrent reload never changes the catalog mid-request.
pub struct VisualMatcher {
    store: Arc<CatalogStore>,
    source: Arc<dyn EmbeddingSource>,
    config: PipelineConfig,
}

impl VisualMatcher {
    pub fn new(
        store: Arc<CatalogStore>,
        source: Arc<dyn EmbeddingSource>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            source,
            config,
        }
    }

    /// Validate `config`, build its embedding backend and load its catalog.
    pub fn from_config(config: PipelineConfig) -> Result<Self, MatchError> {
        config.validate()?;
        let source = source_from_config(&config.embedding)?;
        let store = CatalogStore::load(&config.catalog)?;
        Ok(Self::new(Arc::new(store), source, config))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<CatalogStore> {
        &self.store
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Re-read the configured catalog files and swap them in atomically.
    pub fn reload_catalog(&self) -> Result<Arc<CatalogSnapshot>, MatchError> {
        Ok(self.store.reload(&self.config.catalog)?)
    }

    /// Apply the default and the maximum to a requested result count.
    pub fn resolve_limit(&self, requested: Option<usize>) -> Result<usize, MatchError> {
        match requested {
            None => Ok(self.config.default_limit),
            Some(0) => Err(RankError::InvalidLimit(0).into()),
            Some(n) if n > self.config.max_limit => Err(MatchError::LimitTooLarge {
                requested: n,
                max: self.config.max_limit,
            }),
            Some(n) => Ok(n),
        }
    }

    /// Embed `input` and return the `limit` most similar catalog products.
    pub async fn match_image(
        &self,
        input: &ImageInput,
        limit: Option<usize>,
    ) -> Result<MatchOutcome, MatchError> {
        // checked before the embedding call so an empty catalog costs nothing
        let snapshot = self.pinned_snapshot()?;
        let limit = self.resolve_limit(limit)?;

        let span = MetricsSpan::start();
        let embedded = embed_with_timeout(self.source.as_ref(), input, self.config.embed_timeout())
            .await
            .and_then(|query| usable_embedding(query, &snapshot));
        if let Some(span) = span {
            let recorded = match &embedded {
                Ok(_) => Ok(()),
                Err(err) => Err(MatchError::from(err.clone()).kind()),
            };
            span.record_embedding(recorded);
        }
        let query = embedded?;

        let mut outcome = self.rank_snapshot(&snapshot, query.as_slice(), limit)?;
        outcome.query_image = input.as_url().map(str::to_string);
        Ok(outcome)
    }

    /// Rank a caller-supplied query vector against the current catalog.
    pub fn rank_vector(&self, query: &[f32], limit: Option<usize>) -> Result<MatchOutcome, MatchError> {
        let snapshot = self.pinned_snapshot()?;
        let limit = self.resolve_limit(limit)?;
        self.rank_snapshot(&snapshot, query, limit)
    }

    /// The current snapshot, or `EmptyCatalog` if nothing is loaded.
    fn pinned_snapshot(&self) -> Result<Arc<CatalogSnapshot>, MatchError> {
        let snapshot = self.store.snapshot();
        if snapshot.is_empty() {
            tracing::error!(catalog_version = snapshot.version(), "request against an empty catalog");
            return Err(RankError::EmptyCatalog.into());
        }
        Ok(snapshot)
    }

    fn rank_snapshot(
        &self,
        snapshot: &CatalogSnapshot,
        query: &[f32],
        limit: usize,
    ) -> Result<MatchOutcome, MatchError> {
        let span = MetricsSpan::start();
        let ranked = rank(query, snapshot.catalog(), limit);
        if let Some(span) = span {
            if snapshot.zero_norm_entries() > 0 {
                span.record_data_quality(snapshot.zero_norm_entries());
            }
            let recorded = match &ranked {
                Ok(results) => Ok(results.len()),
                Err(err) => Err(MatchError::from(err.clone()).kind()),
            };
            span.record_ranking(snapshot.len(), recorded);
        }

        let results = ranked?;

        Ok(MatchOutcome {
            query_image: None,
            catalog_version: snapshot.version(),
            total: results.len(),
            results,
        })
    }
}

/// Reject a backend vector that cannot be ranked against `snapshot`.
///
/// The embedding came from the service, not the caller, so a wrong width or a
/// degenerate vector is an invalid upstream response rather than a bad request.
fn usable_embedding(
    query: EmbeddingVector,
    snapshot: &CatalogSnapshot,
) -> Result<EmbeddingVector, EmbeddingError> {
    if let Some(dimension) = snapshot.dimension() {
        if query.dimension() != dimension {
            return Err(EmbeddingError::InvalidResponse(format!(
                "embedding has dimension {}, catalog has dimension {dimension}",
                query.dimension()
            )));
        }
    }
    if !query.is_finite() {
        return Err(EmbeddingError::InvalidResponse(
            "embedding contains non-finite components".into(),
        ));
    }
    if query.l2_norm() == 0.0 {
        return Err(EmbeddingError::InvalidResponse("embedding is a zero vector".into()));
    }
    Ok(query)
}

impl std::fmt::Debug for VisualMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisualMatcher")
            .field("source", &self.source.name())
            .field("catalog_version", &self.store.snapshot().version())
            .field("config", &self.config)
            .finish()
    }
}
