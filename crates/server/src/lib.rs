//! vismatch server: HTTP REST API for the visual product matcher
//!
//! Embeds a query image through the configured embedding backend and ranks
//! the loaded product catalog by cosine similarity.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe (503 until a catalog is loaded)
//! - `GET /metrics` - Prometheus metrics
//! - `POST /api/v1/match` - `{image_url | image_base64, limit?}`
//! - `POST /api/v1/match/upload` - multipart `image` file, optional `limit`
//! - `POST /api/v1/rank` - `{vector, limit?}`
//! - `POST /api/v1/catalog/reload` - Reload catalog files
//! - `GET /api/v1/catalog/stats` - Catalog version and size
//!
//! Results are returned unfiltered. Score thresholds for display are a
//! client concern; see `examples/api_client.rs`.

pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
