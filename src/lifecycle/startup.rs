//! Startup orchestration.
//!
//! Order: configuration, logging, telemetry (metrics registry and cluster
//! event recorder), then the listener. Any error here is fatal.

use std::path::Path;
use std::sync::Arc;

use metrics_exporter_prometheus::BuildError;
use tokio::net::TcpListener;

use crate::config::{load_config, ConfigError, SimConfig};
use crate::observability::events::resolve_recorder;
use crate::observability::metrics::Metrics;
use crate::observability::Telemetry;

/// Load the config file if given, otherwise use defaults. `bind` overrides the listener address.
pub fn resolve_config(path: Option<&Path>, bind: Option<String>) -> Result<SimConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => SimConfig::default(),
    };
    if let Some(bind) = bind {
        config.listener.bind_address = bind;
    }
    crate::config::validation::validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Build the metrics registry and pick the cluster event recorder. Called once.
pub fn build_telemetry(config: &SimConfig) -> Result<Telemetry, BuildError> {
    let metrics = Arc::new(Metrics::new()?);
    let recorder = resolve_recorder(&config.observability.cluster_events);
    Ok(Telemetry::new(metrics, config.observability.error_labels).with_event_recorder(recorder))
}

/// Bind the configured listener address.
pub async fn bind_listener(config: &SimConfig) -> Result<TcpListener, std::io::Error> {
    TcpListener::bind(&config.listener.bind_address).await
}
