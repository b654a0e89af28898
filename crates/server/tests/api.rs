//! HTTP routes exercised in-process through the router.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use server::{build_router, ServerConfig, ServerState};
use tempfile::TempDir;
use tower::ServiceExt;
use vismatch::{
    Catalog, CatalogSource, CatalogStore, EmbeddingConfig, EmbeddingError, EmbeddingSource,
    EmbeddingVector, ImageInput, PipelineConfig, VisualMatcher,
};

/// Answers every image with the same vector.
struct FixedSource(Vec<f32>);

#[async_trait]
impl EmbeddingSource for FixedSource {
    async fn embed(&self, input: &ImageInput) -> Result<EmbeddingVector, EmbeddingError> {
        input.validate(1024 * 1024)?;
        Ok(EmbeddingVector::new(self.0.clone()))
    }
}

struct DownSource;

#[async_trait]
impl EmbeddingSource for DownSource {
    async fn embed(&self, _input: &ImageInput) -> Result<EmbeddingVector, EmbeddingError> {
        Err(EmbeddingError::Unavailable("HTTP 503 Service Unavailable".into()))
    }
}

fn write_catalog(path: &Path, rows: Value) {
    fs::write(path, serde_json::to_vec(&rows).unwrap()).unwrap();
}

fn shoes() -> Value {
    json!([
        { "id": 1, "name": "Red Shoe", "category": "Footwear", "image": "/images/red_shoe.jpg", "embedding": [1.0, 0.0, 0.0] },
        { "id": 2, "name": "Blue Shoe", "category": "Footwear", "image": "/images/blue_shoe.jpg", "embedding": [0.0, 1.0, 0.0] },
        { "id": 3, "name": "Red Bag", "category": "Bags", "image": "/images/red_bag.jpg", "embedding": [0.9, 0.1, 0.0] }
    ])
}

struct TestApp {
    router: Router,
    state: Arc<ServerState>,
    path: std::path::PathBuf,
    _dir: TempDir,
}

fn app_with(source: Arc<dyn EmbeddingSource>, rows: Value) -> TestApp {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("catalog.json");
    write_catalog(&path, rows);

    let pipeline = PipelineConfig {
        catalog: CatalogSource::combined(&path),
        embedding: EmbeddingConfig::stub(3),
        ..Default::default()
    };
    let store = CatalogStore::load(&pipeline.catalog).unwrap();
    let matcher = VisualMatcher::new(Arc::new(store), source, pipeline.clone());
    let config = ServerConfig {
        pipeline,
        ..Default::default()
    };
    let state = Arc::new(ServerState::with_matcher(config, Arc::new(matcher)));

    TestApp {
        router: build_router(state.clone()),
        state,
        path,
        _dir: dir,
    }
}

fn app() -> TestApp {
    app_with(Arc::new(FixedSource(vec![1.0, 0.0, 0.0])), shoes())
}

fn empty_app() -> TestApp {
    let dir = TempDir::new().unwrap();
    let config = ServerConfig {
        pipeline: PipelineConfig {
            embedding: EmbeddingConfig::stub(3),
            ..Default::default()
        },
        ..Default::default()
    };
    let matcher = VisualMatcher::new(
        Arc::new(CatalogStore::new(Catalog::empty())),
        Arc::new(FixedSource(vec![1.0, 0.0, 0.0])),
        config.pipeline.clone(),
    );
    let state = Arc::new(ServerState::with_matcher(config, Arc::new(matcher)));
    TestApp {
        router: build_router(state.clone()),
        state,
        path: dir.path().join("unused.json"),
        _dir: dir,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_and_info() {
    let app = app();

    let (status, body) = send(&app.router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app.router, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["api_version"], "v1");
}

#[tokio::test]
async fn readiness_follows_the_catalog() {
    let (status, body) = send(&app().router, get("/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["components"]["catalog"]["entries"], 3);

    let (status, body) = send(&empty_app().router, get("/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "NOT_READY");
}

#[tokio::test]
async fn match_by_url_returns_ranked_products() {
    let app = app();
    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/v1/match", json!({ "image_url": "https://cdn.example.com/q.jpg" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["query_image"], "https://cdn.example.com/q.jpg");
    assert_eq!(body["catalog_version"], 1);
    assert_eq!(body["total"], 3);

    let names: Vec<&str> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Red Shoe", "Red Bag", "Blue Shoe"]);
    assert_eq!(body["results"][0]["id"], "1");
    assert_eq!(body["results"][0]["score"], 1.0);
    assert_eq!(body["results"][0]["rank"], 1);
    // low scores are not filtered by the server
    assert_eq!(body["results"][2]["score"], 0.0);
}

#[tokio::test]
async fn caller_request_id_is_echoed() {
    let app = app();
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");
}

#[tokio::test]
async fn match_by_base64_respects_limit() {
    let app = app();
    let (status, body) = send(
        &app.router,
        post_json("/api/v1/match", json!({ "image_base64": "data:image/jpeg;base64,/9j/4AA=", "limit": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert!(body.get("query_image").is_none());
}

#[tokio::test]
async fn malformed_requests_are_400() {
    let app = app();

    let (status, body) = send(&app.router, post_json("/api/v1/match", json!({ "limit": 3 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, body) = send(&app.router, post_json("/api/v1/match", json!({ "image_url": "ftp://x/a.jpg" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_IMAGE");
    assert_eq!(body["error"]["kind"], "validation");

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/match")
        .header("content-type", "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let (status, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app.router,
        post_json("/api/v1/match", json!({ "image_url": "https://x.io/a.jpg", "limit": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_LIMIT");

    let (status, body) = send(
        &app.router,
        post_json("/api/v1/match", json!({ "image_url": "https://x.io/a.jpg", "limit": 101 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_LIMIT");
}

#[tokio::test]
async fn rank_vector_validates_the_query() {
    let app = app();

    let (status, body) = send(&app.router, post_json("/api/v1/rank", json!({ "vector": [0.0, 1.0, 0.0], "limit": 2 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][0]["name"], "Blue Shoe");
    assert_eq!(body["total"], 2);

    let (status, body) = send(&app.router, post_json("/api/v1/rank", json!({ "vector": [1.0, 0.0] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "DIMENSION_MISMATCH");

    let (status, body) = send(&app.router, post_json("/api/v1/rank", json!({ "vector": [0.0, 0.0, 0.0] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "ZERO_QUERY");
}

#[tokio::test]
async fn empty_catalog_is_500() {
    let app = empty_app();
    let (status, body) = send(&app.router, post_json("/api/v1/rank", json!({ "vector": [1.0, 0.0, 0.0] }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "EMPTY_CATALOG");
    assert_eq!(body["error"]["kind"], "internal");
}

#[tokio::test]
async fn unavailable_embedding_source_is_503() {
    let app = app_with(Arc::new(DownSource), shoes());
    let (status, body) = send(
        &app.router,
        post_json("/api/v1/match", json!({ "image_url": "https://x.io/a.jpg" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "EMBEDDING_UNAVAILABLE");
    assert_eq!(body["error"]["kind"], "upstream");
}

#[tokio::test]
async fn unusable_embedding_from_the_backend_is_503() {
    for vector in [vec![1.0, 0.0], vec![0.0, 0.0, 0.0]] {
        let app = app_with(Arc::new(FixedSource(vector)), shoes());
        let (status, body) = send(
            &app.router,
            post_json("/api/v1/match", json!({ "image_url": "https://x.io/a.jpg" })),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "INVALID_EMBEDDING_RESPONSE");
        assert_eq!(body["error"]["kind"], "upstream");
    }
}

#[tokio::test]
async fn multipart_upload() {
    let app = app_with(Arc::new(FixedSource(vec![0.0, 1.0, 0.0])), shoes());
    let boundary = "vismatch-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"limit\"\r\n\r\n2\r\n\
             --{boundary}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"q.jpg\"\r\n\
             Content-Type: image/jpeg\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/match/upload")
        .header("content-type", format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap();
    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["total"], 2);
    assert_eq!(body["results"][0]["name"], "Blue Shoe");
    assert!(body.get("query_image").is_none());
}

#[tokio::test]
async fn multipart_without_image_is_400() {
    let app = app();
    let boundary = "b";
    let body = format!("--{boundary}\r\nContent-Disposition: form-data; name=\"limit\"\r\n\r\n2\r\n--{boundary}--\r\n");
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/match/upload")
        .header("content-type", format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap();
    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn catalog_reload_and_stats() {
    let app = app();

    let (status, body) = send(&app.router, get("/api/v1/catalog/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], 1);
    assert_eq!(body["entries"], 3);
    assert_eq!(body["dimension"], 3);
    assert_eq!(body["zero_norm_entries"], 0);
    assert!(body["loaded_at"].is_string());

    write_catalog(
        &app.path,
        json!([
            { "id": "h1", "name": "Green Hat", "category": "Hats", "image": "/h.jpg", "embedding": [1.0, 0.0, 0.0] },
            { "id": "z", "name": "Blank", "image": "/z.jpg", "embedding": [0.0, 0.0, 0.0] }
        ]),
    );
    let (status, body) = send(&app.router, post_json("/api/v1/catalog/reload", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], 2);
    assert_eq!(body["entries"], 2);
    assert_eq!(body["zero_norm_entries"], 1);

    let (_, body) = send(&app.router, post_json("/api/v1/match", json!({ "image_url": "https://x.io/a.jpg" }))).await;
    assert_eq!(body["catalog_version"], 2);
    assert_eq!(body["results"][0]["name"], "Green Hat");
    assert_eq!(body["results"][1]["category"], "General");
}

#[tokio::test]
async fn failed_reload_keeps_the_old_catalog() {
    let app = app();
    fs::write(&app.path, "[{ truncated").unwrap();

    let (status, body) = send(&app.router, post_json("/api/v1/catalog/reload", json!({}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "CATALOG_ERROR");

    assert_eq!(app.state.matcher.store().snapshot().version(), 1);
    let (status, body) = send(&app.router, post_json("/api/v1/rank", json!({ "vector": [1.0, 0.0, 0.0] }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
}

#[tokio::test]
async fn unknown_routes_and_disabled_metrics_are_404() {
    let app = app();

    let (status, body) = send(&app.router, get("/api/v1/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = send(&app.router, get("/metrics")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
