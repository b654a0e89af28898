//! Failure classification across the pipeline.

use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use vismatch::{
    Catalog, CatalogSource, CatalogStore, EmbeddingConfig, EmbeddingError, EmbeddingSource,
    EmbeddingVector, ErrorKind, ImageInput, MatchError, PipelineConfig, ProductRecord, RankError,
    StubEmbeddingSource, VisualMatcher,
};

struct FixedSource(Vec<f32>);

#[async_trait]
impl EmbeddingSource for FixedSource {
    async fn embed(&self, _input: &ImageInput) -> Result<EmbeddingVector, EmbeddingError> {
        Ok(EmbeddingVector::new(self.0.clone()))
    }
}

/// Fails every call and counts how often it was asked.
#[derive(Default)]
struct DownSource(AtomicUsize);

#[async_trait]
impl EmbeddingSource for DownSource {
    async fn embed(&self, _input: &ImageInput) -> Result<EmbeddingVector, EmbeddingError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Err(EmbeddingError::Unavailable("HTTP 503 Service Unavailable".into()))
    }
}

struct SlowSource;

#[async_trait]
impl EmbeddingSource for SlowSource {
    async fn embed(&self, _input: &ImageInput) -> Result<EmbeddingVector, EmbeddingError> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(EmbeddingVector::new(vec![1.0, 0.0]))
    }
}

fn two_d_catalog() -> Catalog {
    Catalog::from_parts(
        vec![
            ProductRecord::new("1", "Red Shoe", "Footwear", "/images/red_shoe.jpg"),
            ProductRecord::new("2", "Blue Shoe", "Footwear", "/images/blue_shoe.jpg"),
        ],
        vec![
            EmbeddingVector::new(vec![1.0, 0.0]),
            EmbeddingVector::new(vec![0.0, 1.0]),
        ],
    )
    .unwrap()
}

fn matcher(catalog: Catalog, source: Arc<dyn EmbeddingSource>) -> VisualMatcher {
    let config = PipelineConfig {
        embed_timeout_ms: 50,
        embedding: EmbeddingConfig::stub(2),
        ..Default::default()
    };
    VisualMatcher::new(Arc::new(CatalogStore::new(catalog)), source, config)
}

#[test]
fn dimension_mismatch_is_a_validation_error() {
    let catalog = Catalog::from_parts(
        vec![ProductRecord::new("1", "a", "General", "/a.jpg")],
        vec![EmbeddingVector::new(vec![0.5; 768])],
    )
    .unwrap();
    let m = matcher(catalog, Arc::new(FixedSource(vec![0.5; 768])));

    let err = m.rank_vector(&[0.5; 512], None).unwrap_err();
    assert!(matches!(
        err,
        MatchError::Rank(RankError::DimensionMismatch { query: 512, catalog: 768 })
    ));
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(!err.is_retryable());
}

#[test]
fn empty_catalog_is_reported_before_anything_else() {
    let m = matcher(Catalog::empty(), Arc::new(FixedSource(vec![1.0, 0.0])));

    for (query, limit) in [(vec![1.0f32, 0.0], Some(5)), (vec![], Some(0)), (vec![0.0, 0.0], None)] {
        let err = m.rank_vector(&query, limit).unwrap_err();
        assert!(matches!(err, MatchError::Rank(RankError::EmptyCatalog)), "{err}");
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}

#[tokio::test]
async fn empty_catalog_skips_the_embedding_call() {
    let down = Arc::new(DownSource::default());
    let m = matcher(Catalog::empty(), down.clone());

    let err = m.match_image(&ImageInput::url("https://x.io/a.jpg"), None).await.unwrap_err();
    assert!(matches!(err, MatchError::Rank(RankError::EmptyCatalog)));
    assert_eq!(down.0.load(Ordering::SeqCst), 0);
}

#[test]
fn limits_are_bounded() {
    let m = matcher(two_d_catalog(), Arc::new(FixedSource(vec![1.0, 0.0])));

    let err = m.rank_vector(&[1.0, 0.0], Some(0)).unwrap_err();
    assert!(matches!(err, MatchError::Rank(RankError::InvalidLimit(0))));
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = m.rank_vector(&[1.0, 0.0], Some(101)).unwrap_err();
    assert!(matches!(err, MatchError::LimitTooLarge { requested: 101, max: 100 }));
    assert_eq!(err.code(), "INVALID_LIMIT");

    // above the catalog size but within the maximum: everything comes back
    assert_eq!(m.rank_vector(&[1.0, 0.0], Some(100)).unwrap().total, 2);
}

#[test]
fn zero_and_non_finite_queries_are_rejected() {
    let m = matcher(two_d_catalog(), Arc::new(FixedSource(vec![1.0, 0.0])));

    let err = m.rank_vector(&[0.0, 0.0], None).unwrap_err();
    assert!(matches!(err, MatchError::Rank(RankError::ZeroQuery)));

    let err = m.rank_vector(&[f32::NAN, 1.0], None).unwrap_err();
    assert!(matches!(err, MatchError::Rank(RankError::InvalidQuery(_))));
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn slow_embedding_source_times_out_as_upstream() {
    let m = matcher(two_d_catalog(), Arc::new(SlowSource));

    let err = m
        .match_image(&ImageInput::url("https://x.io/a.jpg"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, MatchError::Embedding(EmbeddingError::Unavailable(_))), "{err}");
    assert_eq!(err.kind(), ErrorKind::Upstream);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn unavailable_source_is_upstream() {
    let m = matcher(two_d_catalog(), Arc::new(DownSource::default()));

    let err = m
        .match_image(&ImageInput::bytes(vec![1u8, 2, 3]), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Upstream);
    assert_eq!(err.code(), "EMBEDDING_UNAVAILABLE");
}

#[tokio::test]
async fn wrong_width_embedding_is_an_upstream_error() {
    let m = matcher(two_d_catalog(), Arc::new(FixedSource(vec![1.0, 0.0, 0.0])));

    let err = m
        .match_image(&ImageInput::url("https://x.io/a.jpg"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, MatchError::Embedding(EmbeddingError::InvalidResponse(_))), "{err}");
    assert_eq!(err.kind(), ErrorKind::Upstream);
    assert_eq!(err.code(), "INVALID_EMBEDDING_RESPONSE");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn zero_embedding_is_an_upstream_error() {
    let m = matcher(two_d_catalog(), Arc::new(FixedSource(vec![0.0, 0.0])));

    let err = m
        .match_image(&ImageInput::url("https://x.io/a.jpg"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, MatchError::Embedding(EmbeddingError::InvalidResponse(_))), "{err}");
    assert_eq!(err.kind(), ErrorKind::Upstream);
    assert!(err.is_retryable());

    // the same vector supplied by the caller stays a bad request
    let err = m.rank_vector(&[0.0, 0.0], None).unwrap_err();
    assert!(matches!(err, MatchError::Rank(RankError::ZeroQuery)));
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn bad_image_input_is_a_validation_error() {
    let m = matcher(two_d_catalog(), Arc::new(StubEmbeddingSource::new(2)));

    let err = m
        .match_image(&ImageInput::url("/images/local.jpg"), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.code(), "INVALID_IMAGE");

    let err = m
        .match_image(&ImageInput::bytes(Vec::<u8>::new()), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn missing_catalog_files_fail_pipeline_construction() {
    let dir = TempDir::new().unwrap();
    let err = VisualMatcher::from_config(PipelineConfig {
        catalog: CatalogSource::paired(dir.path().join("nope.json"), dir.path().join("nope2.json")),
        embedding: EmbeddingConfig::stub(2),
        ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(err, MatchError::Catalog(_)));
    assert_eq!(err.kind(), ErrorKind::Internal);
}

#[test]
fn invalid_pipeline_config_is_rejected() {
    let err = VisualMatcher::from_config(PipelineConfig {
        max_limit: 1,
        embedding: EmbeddingConfig::stub(2),
        ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(err, MatchError::Config(_)));
}

#[test]
fn failed_reload_keeps_serving_the_old_catalog() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("catalog.json");
    fs::write(
        &path,
        r#"[{"id": 1, "name": "Red Shoe", "category": "Footwear", "image": "/r.jpg", "embedding": [1.0, 0.0]}]"#,
    )
    .unwrap();

    let m = VisualMatcher::from_config(PipelineConfig {
        catalog: CatalogSource::combined(&path),
        embedding: EmbeddingConfig::stub(2),
        ..Default::default()
    })
    .unwrap();

    fs::write(&path, "[{ not json").unwrap();
    let err = m.reload_catalog().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);

    let outcome = m.rank_vector(&[1.0, 0.0], None).unwrap();
    assert_eq!(outcome.catalog_version, 1);
    assert_eq!(outcome.results[0].product().name, "Red Shoe");
}

#[test]
fn zero_norm_catalog_entry_does_not_fail_requests() {
    let catalog = Catalog::from_parts(
        vec![
            ProductRecord::new("1", "Broken", "General", "/broken.jpg"),
            ProductRecord::new("2", "Fine", "General", "/fine.jpg"),
        ],
        vec![EmbeddingVector::new(vec![0.0, 0.0]), EmbeddingVector::new(vec![1.0, 1.0])],
    )
    .unwrap();
    assert_eq!(catalog.zero_norm_entries(), 1);
    let m = matcher(catalog, Arc::new(FixedSource(vec![1.0, 0.0])));

    let outcome = m.rank_vector(&[1.0, 0.0], None).unwrap();
    assert_eq!(outcome.total, 2);
    assert_eq!(outcome.results[0].product().name, "Fine");
    assert_eq!(outcome.results[1].score(), 0.0);
}
