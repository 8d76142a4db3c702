//! Shared utilities for integration and load testing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use metric_sim::config::{ErrorLabelMode, SimConfig};
use metric_sim::observability::metrics::Metrics;
use metric_sim::{HttpServer, Shutdown, Telemetry};
use metric_sim_sdk::SimClient;
use tokio::net::TcpListener;

/// A running simulator bound to an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: SimClient,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Config with no random flips and the given latency window.
#[allow(dead_code)]
pub fn stable_config(min_latency_ms: u64, max_latency_ms: u64) -> SimConfig {
    let mut config = SimConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.faults.db_flip_probability = 0.0;
    config.faults.third_party_flip_probability = 0.0;
    config.processing.min_latency_ms = min_latency_ms;
    config.processing.max_latency_ms = max_latency_ms;
    config
}

/// Start a simulator with its own metrics registry.
pub async fn start_server(config: SimConfig) -> TestServer {
    let telemetry = Telemetry::new(Arc::new(Metrics::new().unwrap()), config.observability.error_labels);
    start_server_with(config, telemetry).await
}

#[allow(dead_code)]
pub async fn start_server_with_labels(mut config: SimConfig, labels: ErrorLabelMode) -> TestServer {
    config.observability.error_labels = labels;
    start_server(config).await
}

pub async fn start_server_with(config: SimConfig, telemetry: Telemetry) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, telemetry);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap();
    let client = SimClient::with_client(client, &format!("http://{}", addr));

    // Wait until the listener answers.
    for _ in 0..50 {
        if client.metrics().await.is_ok() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    TestServer { addr, client, shutdown }
}

/// Value of the first sample named `name` carrying all of `labels`, or 0 if absent.
#[allow(dead_code)]
pub fn sample_value(text: &str, name: &str, labels: &[(&str, &str)]) -> f64 {
    text.lines()
        .filter(|line| !line.starts_with('#'))
        .filter(|line| {
            let series = line.split_whitespace().next().unwrap_or_default();
            series == name || series.starts_with(&format!("{}{{", name))
        })
        .find(|line| {
            labels
                .iter()
                .all(|(k, v)| line.contains(&format!("{}=\"{}\"", k, v)))
        })
        .and_then(|line| line.rsplit(' ').next())
        .and_then(|value| value.parse().ok())
        .unwrap_or(0.0)
}
