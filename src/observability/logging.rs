//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the `tracing` subscriber (JSON or pretty)
//! - Define the diagnostic record written for every classified error
//! - Provide the sink abstraction diagnostics are written through
//!
//! Writing a record never fails; a sink that cannot deliver drops the record.

use std::backtrace::Backtrace;
use std::fmt;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured filter.
pub fn init_logging(
    config: &ObservabilityConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))?;

    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(false)
                    .with_target(true),
            )
            .try_init()?,
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()?,
    }

    Ok(())
}

/// Severity of a diagnostic record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        }
    }

    /// Error and critical records carry a stack capture.
    pub fn captures_stack(&self) -> bool {
        *self >= Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structured diagnostic log entry.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticRecord {
    pub timestamp: String,
    pub level: Severity,
    pub trace_id: String,
    pub error_type: &'static str,
    pub message: String,
    pub order_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}

impl DiagnosticRecord {
    pub fn new(
        level: Severity,
        trace_id: impl Into<String>,
        error_type: &'static str,
        message: impl Into<String>,
        order_id: impl Into<String>,
    ) -> Self {
        let stack_trace = level
            .captures_stack()
            .then(|| Backtrace::force_capture().to_string());

        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            level,
            trace_id: trace_id.into(),
            error_type,
            message: message.into(),
            order_id: order_id.into(),
            stack_trace,
        }
    }
}

/// Destination for diagnostic records.
pub trait LogSink: Send + Sync {
    fn write(&self, record: &DiagnosticRecord);
}

/// Writes diagnostics as `tracing` events under the `metric_sim::diagnostic` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write(&self, record: &DiagnosticRecord) {
        let stack_trace = record.stack_trace.as_deref().unwrap_or_default();
        match record.level {
            Severity::Error | Severity::Critical => tracing::error!(
                target: "metric_sim::diagnostic",
                record_timestamp = %record.timestamp,
                level_name = %record.level,
                trace_id = %record.trace_id,
                error_type = record.error_type,
                order_id = %record.order_id,
                stack_trace = stack_trace,
                "{}",
                record.message
            ),
            Severity::Warning => tracing::warn!(
                target: "metric_sim::diagnostic",
                record_timestamp = %record.timestamp,
                level_name = %record.level,
                trace_id = %record.trace_id,
                error_type = record.error_type,
                order_id = %record.order_id,
                "{}",
                record.message
            ),
            Severity::Info => tracing::info!(
                target: "metric_sim::diagnostic",
                record_timestamp = %record.timestamp,
                level_name = %record.level,
                trace_id = %record.trace_id,
                error_type = record.error_type,
                order_id = %record.order_id,
                "{}",
                record.message
            ),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_error_records_capture_stack() {
        let record = DiagnosticRecord::new(Severity::Error, "t", "ValidationError", "Invalid order_id", "invalid");
        assert!(record.stack_trace.is_some());

        let record = DiagnosticRecord::new(Severity::Warning, "t", "ValidationError", "m", "o");
        assert!(record.stack_trace.is_none());
    }

    #[test]
    fn test_record_serializes_required_fields() {
        let record = DiagnosticRecord::new(
            Severity::Critical,
            "abc",
            "UnexpectedError",
            "fault state lock poisoned",
            "42",
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["level"], "critical");
        assert_eq!(json["trace_id"], "abc");
        assert_eq!(json["error_type"], "UnexpectedError");
        assert_eq!(json["order_id"], "42");
        assert!(json["stack_trace"].is_string());
        assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture_json_lines(record: &DiagnosticRecord) -> Vec<serde_json::Value> {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .flatten_event(true)
            .with_max_level(tracing::Level::TRACE)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || TracingSink.write(record));

        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_tracing_sink_emits_correlation_fields() {
        let record = DiagnosticRecord::new(
            Severity::Error,
            "5f0c6a1e-trace",
            "DatabaseConnectionError",
            "Failed to connect to database",
            "1001",
        );
        let lines = capture_json_lines(&record);
        assert_eq!(lines.len(), 1);

        let line = &lines[0];
        assert_eq!(line["target"], "metric_sim::diagnostic");
        assert_eq!(line["level"], "ERROR");
        assert_eq!(line["message"], "Failed to connect to database");
        assert_eq!(line["trace_id"], "5f0c6a1e-trace");
        assert_eq!(line["error_type"], "DatabaseConnectionError");
        assert_eq!(line["order_id"], "1001");
        assert_eq!(line["level_name"], "error");
        assert!(!line["stack_trace"].as_str().unwrap().is_empty());
    }

    #[test]
    fn test_tracing_sink_warning_has_no_stack() {
        let record = DiagnosticRecord::new(Severity::Warning, "t-1", "ThirdPartyTimeout", "slow", "7");
        let lines = capture_json_lines(&record);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["level"], "WARN");
        assert_eq!(lines[0]["trace_id"], "t-1");
        assert!(lines[0].get("stack_trace").is_none());
    }

    #[test]
    fn test_tracing_sink_without_subscriber_does_not_panic() {
        let record = DiagnosticRecord::new(Severity::Error, "t", "DatabaseConnectionError", "m", "o");
        TracingSink.write(&record);
    }
}
