use crate::config::ServerConfig;
use crate::error::ServerResult;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use vismatch::VisualMatcher;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Matcher instance (shared across requests)
    pub matcher: Arc<VisualMatcher>,

    /// Renders `/metrics`; `None` when metrics are disabled
    pub prometheus: Option<PrometheusHandle>,
}

impl ServerState {
    /// Create new server state, loading the catalog and building the
    /// embedding backend named in `config.pipeline`.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let matcher = VisualMatcher::from_config(config.pipeline.clone())?;
        Ok(Self::with_matcher(config, Arc::new(matcher)))
    }

    /// Wrap an already built matcher.
    pub fn with_matcher(config: ServerConfig, matcher: Arc<VisualMatcher>) -> Self {
        Self {
            config: Arc::new(config),
            matcher,
            prometheus: None,
        }
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}

/// Server metadata for health checks
#[derive(Debug, serde::Serialize)]
pub struct ServerMetadata {
    pub version: String,
    pub uptime_seconds: u64,
}
