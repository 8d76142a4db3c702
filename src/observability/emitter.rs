//! Single entry point for everything a request handler reports.

use std::sync::Arc;
use std::time::Duration;

use crate::config::ErrorLabelMode;
use crate::health::state::FaultFlags;
use crate::observability::events::{ClusterEvent, EventRecorder, NoopRecorder};
use crate::observability::logging::{DiagnosticRecord, LogSink, TracingSink};
use crate::observability::metrics::{ErrorCorrelation, Metrics};

/// Metrics, diagnostic logs and cluster events behind one cloneable handle.
#[derive(Clone)]
pub struct Telemetry {
    metrics: Arc<Metrics>,
    log_sink: Arc<dyn LogSink>,
    events: Arc<dyn EventRecorder>,
    error_labels: ErrorLabelMode,
}

impl Telemetry {
    /// Telemetry that logs through `tracing` and drops cluster events.
    pub fn new(metrics: Arc<Metrics>, error_labels: ErrorLabelMode) -> Self {
        Self {
            metrics,
            log_sink: Arc::new(TracingSink),
            events: Arc::new(NoopRecorder),
            error_labels,
        }
    }

    pub fn with_log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log_sink = sink;
        self
    }

    pub fn with_event_recorder(mut self, recorder: Arc<dyn EventRecorder>) -> Self {
        self.events = recorder;
        self
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn error_labels(&self) -> ErrorLabelMode {
        self.error_labels
    }

    pub fn record_request(&self, method: &str, endpoint: &str, status: u16, duration: Duration) {
        self.metrics.record_request(method, endpoint, status, duration);
    }

    /// Count an error. Correlation labels are only attached in extended mode.
    pub fn record_error(&self, error_type: &'static str, endpoint: &str, order_id: &str, trace_id: &str) {
        let correlation = match self.error_labels {
            ErrorLabelMode::Basic => None,
            ErrorLabelMode::Extended => Some(ErrorCorrelation { order_id, trace_id }),
        };
        self.metrics.record_error(error_type, endpoint, correlation);
    }

    pub fn set_dependency_gauges(&self, flags: FaultFlags) {
        self.metrics.set_dependency_gauges(flags);
    }

    pub fn log_diagnostic(&self, record: &DiagnosticRecord) {
        self.log_sink.write(record);
    }

    pub fn emit_cluster_event(&self, event: ClusterEvent) {
        self.events.emit(event);
    }
}
