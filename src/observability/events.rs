//! Cluster event emission.
//!
//! # Responsibilities
//! - Resolve this instance's identity (namespace, pod name) once at startup
//! - Pick the event recorder once at startup: Kubernetes API or no-op
//! - Submit events in the background; failures are logged at debug and dropped
//!
//! Emitting an event never blocks or fails the request that triggered it.

use std::fs;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use reqwest::{Certificate, Client};
use serde_json::json;
use thiserror::Error;

use crate::config::ClusterEventsConfig;

const DEFAULT_NAMESPACE: &str = "default";
const DEFAULT_INSTANCE_NAME: &str = "metric-sim";
const EVENT_SOURCE_COMPONENT: &str = "metric-sim";
const EVENT_TYPE_WARNING: &str = "Warning";

/// Why the Kubernetes event recorder could not be set up.
#[derive(Debug, Error)]
pub enum EventSetupError {
    #[error("{0} is not set")]
    MissingEnv(&'static str),

    #[error("cannot read service account token: {0}")]
    Token(#[source] io::Error),

    #[error("cannot read cluster CA: {0}")]
    CaRead(#[source] io::Error),

    #[error("invalid cluster CA: {0}")]
    CaInvalid(#[source] reqwest::Error),

    #[error("cannot build cluster API client: {0}")]
    Client(#[source] reqwest::Error),
}

/// A warning-level diagnostic event about this instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterEvent {
    pub reason: String,
    pub message: String,
}

impl ClusterEvent {
    pub fn warning(reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            message: message.into(),
        }
    }
}

/// Best-effort event delivery.
pub trait EventRecorder: Send + Sync {
    /// Submit an event. Must return promptly and never panic.
    fn emit(&self, event: ClusterEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRecorder;

impl EventRecorder for NoopRecorder {
    fn emit(&self, event: ClusterEvent) {
        tracing::trace!(reason = %event.reason, "Cluster events disabled, dropping event");
    }
}

/// Where this process runs inside the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceIdentity {
    pub namespace: String,
    pub instance_name: String,
}

impl InstanceIdentity {
    /// Resolve identity from environment variables, then the namespace file, then defaults.
    pub fn resolve<F>(env: F, namespace_file: Option<String>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        let namespace = non_empty(env("POD_NAMESPACE"))
            .or_else(|| non_empty(namespace_file))
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        let instance_name = non_empty(env("POD_NAME"))
            .or_else(|| non_empty(env("HOSTNAME")))
            .unwrap_or_else(|| DEFAULT_INSTANCE_NAME.to_string());

        Self {
            namespace,
            instance_name,
        }
    }
}

/// Posts events to the Kubernetes core API using the pod's service account.
pub struct KubeEventRecorder {
    client: Client,
    events_url: String,
    token: String,
    identity: InstanceIdentity,
}

impl KubeEventRecorder {
    pub fn new(client: Client, api_base: &str, token: String, identity: InstanceIdentity) -> Self {
        let events_url = format!(
            "{}/api/v1/namespaces/{}/events",
            api_base.trim_end_matches('/'),
            identity.namespace
        );
        Self {
            client,
            events_url,
            token,
            identity,
        }
    }

    pub fn identity(&self) -> &InstanceIdentity {
        &self.identity
    }

    fn event_body(&self, event: &ClusterEvent) -> serde_json::Value {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        json!({
            "apiVersion": "v1",
            "kind": "Event",
            "metadata": {
                "generateName": format!("{}-", self.identity.instance_name),
                "namespace": self.identity.namespace,
            },
            "involvedObject": {
                "kind": "Pod",
                "name": self.identity.instance_name,
                "namespace": self.identity.namespace,
            },
            "reason": event.reason,
            "message": event.message,
            "type": EVENT_TYPE_WARNING,
            "firstTimestamp": now,
            "lastTimestamp": now,
            "count": 1,
            "source": { "component": EVENT_SOURCE_COMPONENT },
        })
    }
}

impl EventRecorder for KubeEventRecorder {
    fn emit(&self, event: ClusterEvent) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(reason = %event.reason, "No runtime available, dropping cluster event");
            return;
        };

        let request = self
            .client
            .post(&self.events_url)
            .bearer_auth(&self.token)
            .json(&self.event_body(&event));
        let reason = event.reason;

        runtime.spawn(async move {
            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::trace!(reason = %reason, "Cluster event recorded");
                }
                Ok(response) => {
                    tracing::debug!(reason = %reason, status = %response.status(), "Cluster event rejected");
                }
                Err(e) => {
                    tracing::debug!(reason = %reason, error = %e, "Cluster event delivery failed");
                }
            }
        });
    }
}

/// Choose the event recorder for this process. Called once at startup.
pub fn resolve_recorder(config: &ClusterEventsConfig) -> Arc<dyn EventRecorder> {
    if !config.enabled {
        tracing::info!("Cluster events disabled");
        return Arc::new(NoopRecorder);
    }

    match build_kube_recorder(config, |key| std::env::var(key).ok()) {
        Ok(recorder) => {
            tracing::info!(
                namespace = %recorder.identity().namespace,
                instance = %recorder.identity().instance_name,
                "Cluster events enabled"
            );
            Arc::new(recorder)
        }
        Err(reason) => {
            tracing::info!(reason = %reason, "Cluster API unavailable, cluster events disabled");
            Arc::new(NoopRecorder)
        }
    }
}

fn build_kube_recorder<F>(config: &ClusterEventsConfig, env: F) -> Result<KubeEventRecorder, EventSetupError>
where
    F: Fn(&str) -> Option<String>,
{
    let host = env("KUBERNETES_SERVICE_HOST").ok_or(EventSetupError::MissingEnv("KUBERNETES_SERVICE_HOST"))?;
    let port = env("KUBERNETES_SERVICE_PORT").ok_or(EventSetupError::MissingEnv("KUBERNETES_SERVICE_PORT"))?;

    let token = fs::read_to_string(&config.token_path)
        .map_err(EventSetupError::Token)?
        .trim()
        .to_string();
    let ca = fs::read(&config.ca_path).map_err(EventSetupError::CaRead)?;
    let ca = Certificate::from_pem(&ca).map_err(EventSetupError::CaInvalid)?;

    let client = Client::builder()
        .add_root_certificate(ca)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(EventSetupError::Client)?;

    let identity = InstanceIdentity::resolve(
        &env,
        fs::read_to_string(&config.namespace_path).ok(),
    );
    let api_base = if host.contains(':') {
        format!("https://[{}]:{}", host, port)
    } else {
        format!("https://{}:{}", host, port)
    };

    Ok(KubeEventRecorder::new(client, &api_base, token, identity))
}
