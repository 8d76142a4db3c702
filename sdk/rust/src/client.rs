use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

/// Outcome of one `GET /process_order` call.
#[derive(Debug, Clone)]
pub struct OrderOutcome {
    pub status: StatusCode,
    pub trace_id: Option<String>,
    pub body: serde_json::Value,
    pub elapsed: Duration,
}

impl OrderOutcome {
    pub fn is_processed(&self) -> bool {
        self.status == StatusCode::OK && self.body["status"] == "processed"
    }
}

pub struct SimClient {
    client: Client,
    base_url: String,
}

impl SimClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run a health check. Each call may flip the simulated dependencies.
    pub async fn health(&self) -> Result<HealthResponse, reqwest::Error> {
        self.client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?
            .json()
            .await
    }

    /// Submit an order, optionally forcing a simulated failure (`db` or `api_timeout`).
    pub async fn process_order(
        &self,
        order_id: &str,
        error: Option<&str>,
    ) -> Result<OrderOutcome, reqwest::Error> {
        let mut query = vec![("order_id", order_id)];
        if let Some(error) = error {
            query.push(("error", error));
        }

        let start = Instant::now();
        let resp = self
            .client
            .get(format!("{}/process_order", self.base_url))
            .query(&query)
            .send()
            .await?;
        let status = resp.status();
        let trace_id = resp
            .headers()
            .get("x-trace-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.json().await?;

        Ok(OrderOutcome {
            status,
            trace_id,
            body,
            elapsed: start.elapsed(),
        })
    }

    /// Scrape the Prometheus endpoint.
    pub async fn metrics(&self) -> Result<String, reqwest::Error> {
        self.client
            .get(format!("{}/metrics", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}
