//! Request instrumentation middleware.
//!
//! Runs around every handler, including the 404 fallback:
//! - before: create the [`RequestContext`] and attach it to the request
//! - after: count the request, record latency, tag the response with the
//!   trace ID and write the access log line

use axum::extract::{MatchedPath, Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;

use crate::http::request::{RequestContext, X_TRACE_ID};
use crate::http::server::AppState;

/// Endpoint label for requests that matched no route.
pub const UNKNOWN_ENDPOINT: &str = "unknown";

/// Metric label for a matched route: `/process_order` → `process_order`.
pub fn endpoint_label(matched: Option<&MatchedPath>) -> String {
    matched
        .map(|path| path.as_str().trim_start_matches('/'))
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_ENDPOINT)
        .to_string()
}

pub async fn instrument(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let ctx = RequestContext::from_request(&request);
    let endpoint = endpoint_label(request.extensions().get::<MatchedPath>());
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;

    let duration = ctx.elapsed();
    let status = response.status().as_u16();
    state
        .telemetry
        .record_request(&ctx.method, &endpoint, status, duration);

    if let Ok(value) = HeaderValue::from_str(&ctx.trace_id.to_string()) {
        response.headers_mut().insert(X_TRACE_ID, value);
    }

    tracing::info!(
        target: "metric_sim::access",
        trace_id = %ctx.trace_id,
        method = %ctx.method,
        url = %ctx.url,
        status,
        duration_sec = (duration.as_secs_f64() * 1000.0).round() / 1000.0,
        user_agent = %ctx.user_agent,
        "Request completed"
    );

    response
}

