//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the simulator.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the failure simulator.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SimConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Simulated dependency fault settings.
    pub faults: FaultConfig,

    /// Simulated order processing settings.
    pub processing: ProcessingConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:5000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
        }
    }
}

/// Fault injection configuration.
///
/// Probabilities are applied once per health check, independently per dependency.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FaultConfig {
    /// Chance that a health check flips database connectivity.
    pub db_flip_probability: f64,

    /// Chance that a health check flips third-party API availability.
    pub third_party_flip_probability: f64,

    /// Database connectivity at process start.
    pub db_connected: bool,

    /// Third-party API availability at process start.
    pub third_party_available: bool,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            db_flip_probability: 0.10,
            third_party_flip_probability: 0.05,
            db_connected: true,
            third_party_available: true,
        }
    }
}

/// Simulated processing latency, sampled uniformly from `[min, max)`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProcessingConfig {
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            min_latency_ms: 100,
            max_latency_ms: 500,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Label set attached to the application error counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ErrorLabelMode {
    /// `error_type` and `endpoint` only.
    #[default]
    Basic,
    /// Adds `order_id` and `trace_id`. Every failed request creates a new series.
    Extended,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log output format.
    pub log_format: LogFormat,

    /// Default filter directives, used when `RUST_LOG` is unset.
    pub log_filter: String,

    /// Labels used for `app_errors_total`.
    pub error_labels: ErrorLabelMode,

    /// Cluster event emission.
    pub cluster_events: ClusterEventsConfig,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            log_filter: "metric_sim=info,tower_http=info".to_string(),
            error_labels: ErrorLabelMode::Basic,
            cluster_events: ClusterEventsConfig::default(),
        }
    }
}

/// Kubernetes event emission settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClusterEventsConfig {
    /// Try to emit events to the cluster API. Falls back to a no-op when not in-cluster.
    pub enabled: bool,

    /// Service account token path.
    pub token_path: String,

    /// Cluster CA bundle path.
    pub ca_path: String,

    /// Service account namespace file.
    pub namespace_path: String,

    /// Timeout for a single event submission in seconds.
    pub timeout_secs: u64,
}

impl Default for ClusterEventsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            token_path: "/var/run/secrets/kubernetes.io/serviceaccount/token".to_string(),
            ca_path: "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt".to_string(),
            namespace_path: "/var/run/secrets/kubernetes.io/serviceaccount/namespace".to_string(),
            timeout_secs: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_behaviour() {
        let config = SimConfig::default();
        assert_eq!(config.listener.bind_address, "0.0.0.0:5000");
        assert_eq!(config.faults.db_flip_probability, 0.10);
        assert_eq!(config.faults.third_party_flip_probability, 0.05);
        assert!(config.faults.db_connected);
        assert!(config.faults.third_party_available);
        assert_eq!(config.processing.min_latency_ms, 100);
        assert_eq!(config.processing.max_latency_ms, 500);
        assert_eq!(config.observability.error_labels, ErrorLabelMode::Basic);
        assert!(!config.observability.cluster_events.enabled);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: SimConfig = toml::from_str(
            r#"
            [faults]
            db_flip_probability = 0.5

            [observability]
            error_labels = "extended"
            log_format = "pretty"
            "#,
        )
        .unwrap();

        assert_eq!(config.faults.db_flip_probability, 0.5);
        assert_eq!(config.faults.third_party_flip_probability, 0.05);
        assert_eq!(config.observability.error_labels, ErrorLabelMode::Extended);
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
        assert_eq!(config.listener.bind_address, "0.0.0.0:5000");
    }
}
