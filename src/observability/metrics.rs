//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, endpoint, status
//! - `http_request_duration_seconds` (histogram): latency by endpoint
//! - `app_errors_total` (counter): classified errors by type and endpoint
//! - `db_active_connections` (gauge): 5 while the simulated database is up, else 0
//! - `third_party_api_failures` (gauge): 1 while the simulated API is down, else 0
//!
//! Each [`Metrics`] owns its own Prometheus recorder instead of installing a
//! global one, so independent instances (one per server, one per test) never
//! share series.

use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Label, Unit};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

use crate::health::state::FaultFlags;

pub const REQUESTS_TOTAL: &str = "http_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub const ERRORS_TOTAL: &str = "app_errors_total";
pub const DB_ACTIVE_CONNECTIONS: &str = "db_active_connections";
pub const THIRD_PARTY_API_FAILURES: &str = "third_party_api_failures";

/// Media type of the Prometheus text exposition format.
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Simulated connection count reported while the database is up.
const SIMULATED_DB_CONNECTIONS: f64 = 5.0;

/// Prometheus client default buckets.
const LATENCY_BUCKETS: [f64; 14] = [
    0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

/// Optional high-cardinality labels for the error counter.
#[derive(Debug, Clone, Copy)]
pub struct ErrorCorrelation<'a> {
    pub order_id: &'a str,
    pub trace_id: &'a str,
}

/// In-memory metrics registry with Prometheus rendering.
pub struct Metrics {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
}

impl Metrics {
    pub fn new() -> Result<Self, BuildError> {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
                &LATENCY_BUCKETS,
            )?
            .build_recorder();
        let handle = recorder.handle();
        let metrics = Self { recorder, handle };
        metrics.describe();
        Ok(metrics)
    }

    fn describe(&self) {
        self.scoped(|| {
            describe_counter!(REQUESTS_TOTAL, "Total HTTP requests");
            describe_histogram!(REQUEST_DURATION_SECONDS, Unit::Seconds, "Request duration");
            describe_counter!(ERRORS_TOTAL, "Application errors");
            describe_gauge!(DB_ACTIVE_CONNECTIONS, "Simulated DB connections");
            describe_gauge!(
                THIRD_PARTY_API_FAILURES,
                "Count of simulated third-party failures"
            );
        });
    }

    fn scoped<T>(&self, f: impl FnOnce() -> T) -> T {
        metrics::with_local_recorder(&self.recorder, f)
    }

    /// Count a finished request and record its latency.
    pub fn record_request(&self, method: &str, endpoint: &str, status: u16, duration: Duration) {
        self.scoped(|| {
            counter!(
                REQUESTS_TOTAL,
                "method" => method.to_string(),
                "endpoint" => endpoint.to_string(),
                "status" => status.to_string()
            )
            .increment(1);
            histogram!(REQUEST_DURATION_SECONDS, "endpoint" => endpoint.to_string())
                .record(duration.as_secs_f64());
        });
    }

    /// Count a classified application error.
    ///
    /// Passing a correlation adds per-request labels; each distinct pair becomes
    /// its own series and is never expired.
    pub fn record_error(
        &self,
        error_type: &'static str,
        endpoint: &str,
        correlation: Option<ErrorCorrelation<'_>>,
    ) {
        let mut labels = vec![
            Label::new("error_type", error_type),
            Label::new("endpoint", endpoint.to_string()),
        ];
        if let Some(c) = correlation {
            labels.push(Label::new("order_id", c.order_id.to_string()));
            labels.push(Label::new("trace_id", c.trace_id.to_string()));
        }
        self.scoped(|| counter!(ERRORS_TOTAL, labels).increment(1));
    }

    /// Publish the simulated dependency gauges.
    pub fn set_dependency_gauges(&self, flags: FaultFlags) {
        self.scoped(|| {
            gauge!(DB_ACTIVE_CONNECTIONS).set(if flags.db_connected {
                SIMULATED_DB_CONNECTIONS
            } else {
                0.0
            });
            gauge!(THIRD_PARTY_API_FAILURES).set(if flags.third_party_available {
                0.0
            } else {
                1.0
            });
        });
    }

    /// Render every registered metric in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}


#[cfg(test)]
mod tests {
    use super::test_util::{sample_value, series_count};
    use super::*;

    #[test]
    fn test_request_counter_and_histogram() {
        let metrics = Metrics::new().unwrap();
        metrics.record_request("GET", "health", 200, Duration::from_millis(3));
        metrics.record_request("GET", "health", 200, Duration::from_millis(4));
        metrics.record_request("GET", "process_order", 503, Duration::from_millis(1));

        let text = metrics.render();
        assert_eq!(
            sample_value(&text, REQUESTS_TOTAL, &[("method", "GET"), ("endpoint", "health"), ("status", "200")]),
            Some(2.0)
        );
        assert_eq!(
            sample_value(&text, REQUESTS_TOTAL, &[("endpoint", "process_order"), ("status", "503")]),
            Some(1.0)
        );
        assert!(text.contains("http_request_duration_seconds_bucket"));
        assert_eq!(
            sample_value(&text, "http_request_duration_seconds_count", &[("endpoint", "health")]),
            Some(2.0)
        );
        assert!(text.contains("# HELP http_requests_total Total HTTP requests"));
    }

    #[test]
    fn test_instances_do_not_share_series() {
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.record_request("GET", "health", 200, Duration::ZERO);
        assert!(sample_value(&b.render(), REQUESTS_TOTAL, &[("endpoint", "health")]).is_none());
    }

    #[test]
    fn test_error_labels() {
        let metrics = Metrics::new().unwrap();
        metrics.record_error("ValidationError", "process_order", None);
        metrics.record_error(
            "ThirdPartyTimeout",
            "process_order",
            Some(ErrorCorrelation { order_id: "42", trace_id: "t-1" }),
        );

        let text = metrics.render();
        assert_eq!(
            sample_value(&text, ERRORS_TOTAL, &[("error_type", "ValidationError"), ("endpoint", "process_order")]),
            Some(1.0)
        );
        assert_eq!(
            sample_value(&text, ERRORS_TOTAL, &[("error_type", "ThirdPartyTimeout"), ("order_id", "42"), ("trace_id", "t-1")]),
            Some(1.0)
        );
        assert_eq!(series_count(&text, ERRORS_TOTAL), 2);
    }

    #[test]
    fn test_dependency_gauges() {
        let metrics = Metrics::new().unwrap();
        metrics.set_dependency_gauges(FaultFlags { db_connected: true, third_party_available: false });
        let text = metrics.render();
        assert_eq!(sample_value(&text, DB_ACTIVE_CONNECTIONS, &[]), Some(5.0));
        assert_eq!(sample_value(&text, THIRD_PARTY_API_FAILURES, &[]), Some(1.0));

        metrics.set_dependency_gauges(FaultFlags { db_connected: false, third_party_available: true });
        let text = metrics.render();
        assert_eq!(sample_value(&text, DB_ACTIVE_CONNECTIONS, &[]), Some(0.0));
        assert_eq!(sample_value(&text, THIRD_PARTY_API_FAILURES, &[]), Some(0.0));
    }
}
