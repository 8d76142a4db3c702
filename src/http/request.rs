//! Per-request context.
//!
//! # Responsibilities
//! - Generate a unique trace ID (UUID v4) for every request
//! - Remember when the request started
//! - Carry request metadata to the access log
//!
//! The context is created by the instrumentation middleware, handed to
//! handlers as a request extension and dropped once the response is sent.

use std::fmt;
use std::time::{Duration, Instant};

use axum::http::{header, HeaderName, Request};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Header carrying the trace ID on every response.
pub const X_TRACE_ID: HeaderName = HeaderName::from_static("x-trace-id");

/// Opaque identifier correlating one request's logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(Uuid);

impl TraceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Everything the post-request instrumentation needs about a request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub trace_id: TraceId,
    pub start: Instant,
    pub method: String,
    pub url: String,
    pub user_agent: String,
}

impl RequestContext {
    pub fn from_request<B>(request: &Request<B>) -> Self {
        let user_agent = request
            .headers()
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        Self {
            trace_id: TraceId::new(),
            start: Instant::now(),
            method: request.method().to_string(),
            url: request.uri().to_string(),
            user_agent,
        }
    }

    /// Context for calls made outside an HTTP request.
    pub fn detached() -> Self {
        Self {
            trace_id: TraceId::new(),
            start: Instant::now(),
            method: String::new(),
            url: String::new(),
            user_agent: "unknown".to_string(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
