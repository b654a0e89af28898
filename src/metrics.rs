use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

use crate::error::ErrorKind;

/// Metrics observer for pipeline stages.
pub trait PipelineMetrics: Send + Sync {
    fn record_embedding(&self, latency: Duration, result: Result<(), ErrorKind>);
    /// `Ok` carries the number of results returned.
    fn record_ranking(&self, latency: Duration, catalog_size: usize, result: Result<usize, ErrorKind>);
    /// Called when a ranking ran over zero-norm catalog entries.
    fn record_data_quality(&self, _zero_norm_entries: usize) {}
}

/// Install or clear the global pipeline metrics recorder.
pub fn set_pipeline_metrics(recorder: Option<Arc<dyn PipelineMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn PipelineMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn PipelineMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn PipelineMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Times one stage; a no-op when no recorder is installed.
pub(crate) struct MetricsSpan {
    recorder: Arc<dyn PipelineMetrics>,
    start: Instant,
}

impl MetricsSpan {
    pub(crate) fn start() -> Option<Self> {
        metrics_recorder().map(|recorder| Self {
            recorder,
            start: Instant::now(),
        })
    }

    pub(crate) fn record_embedding(self, result: Result<(), ErrorKind>) {
        self.recorder.record_embedding(self.start.elapsed(), result);
    }

    pub(crate) fn record_ranking(self, catalog_size: usize, result: Result<usize, ErrorKind>) {
        self.recorder
            .record_ranking(self.start.elapsed(), catalog_size, result);
    }

    pub(crate) fn record_data_quality(&self, zero_norm_entries: usize) {
        self.recorder.record_data_quality(zero_norm_entries);
    }
}
