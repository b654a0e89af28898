//! Pipeline observer backed by the `metrics` facade.
//!
//! Installed once at startup; the Prometheus exporter renders whatever is
//! recorded here at `GET /metrics`.

use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use vismatch::{ErrorKind, PipelineMetrics};

const EMBEDDING_SECONDS: &str = "vismatch_embedding_duration_seconds";
const EMBEDDING_TOTAL: &str = "vismatch_embedding_requests_total";
const RANKING_SECONDS: &str = "vismatch_ranking_duration_seconds";
const RANKING_TOTAL: &str = "vismatch_ranking_requests_total";
const CATALOG_ENTRIES: &str = "vismatch_catalog_entries";
const RESULTS_RETURNED: &str = "vismatch_results_returned";
const ZERO_NORM_ENTRIES: &str = "vismatch_catalog_zero_norm_entries";

#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusMetrics;

fn outcome_label<T>(result: &Result<T, ErrorKind>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(kind) => kind.as_str(),
    }
}

impl PipelineMetrics for PrometheusMetrics {
    fn record_embedding(&self, latency: Duration, result: Result<(), ErrorKind>) {
        let outcome = outcome_label(&result);
        metrics::histogram!(EMBEDDING_SECONDS, "outcome" => outcome).record(latency.as_secs_f64());
        metrics::counter!(EMBEDDING_TOTAL, "outcome" => outcome).increment(1);
    }

    fn record_ranking(&self, latency: Duration, catalog_size: usize, result: Result<usize, ErrorKind>) {
        let outcome = outcome_label(&result);
        metrics::histogram!(RANKING_SECONDS, "outcome" => outcome).record(latency.as_secs_f64());
        metrics::counter!(RANKING_TOTAL, "outcome" => outcome).increment(1);
        metrics::gauge!(CATALOG_ENTRIES).set(catalog_size as f64);
        if let Ok(returned) = result {
            metrics::histogram!(RESULTS_RETURNED).record(returned as f64);
        }
    }

    fn record_data_quality(&self, zero_norm_entries: usize) {
        metrics::gauge!(ZERO_NORM_ENTRIES).set(zero_norm_entries as f64);
    }
}

/// Install the global Prometheus recorder and route pipeline events into it.
pub fn install() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    vismatch::set_pipeline_metrics(Some(std::sync::Arc::new(PrometheusMetrics)));
    Ok(handle)
}
