//! Route handlers.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};

use crate::http::request::RequestContext;
use crate::http::response::{internal_error, not_found};
use crate::http::server::AppState;
use crate::observability::logging::{DiagnosticRecord, Severity};
use crate::observability::metrics::PROMETHEUS_CONTENT_TYPE;
use crate::orders::{OrderError, OrderQuery, OrderRequest, OrderResult};

const HEALTH_ENDPOINT: &str = "health";

/// `GET /health`
pub async fn health(State(state): State<AppState>, Extension(ctx): Extension<RequestContext>) -> Response {
    match state.health.report() {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            let error_type = "UnexpectedError";
            let trace_id = ctx.trace_id.to_string();
            state
                .telemetry
                .record_error(error_type, HEALTH_ENDPOINT, "", &trace_id);
            state.telemetry.log_diagnostic(&DiagnosticRecord::new(
                Severity::Critical,
                trace_id,
                error_type,
                e.to_string(),
                "",
            ));
            internal_error()
        }
    }
}

/// `GET /process_order?order_id=..&error=..`
pub async fn process_order(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<OrderResult>, OrderError> {
    // An unparseable query string is treated like an empty order ID.
    let query = match query {
        Ok(Query(pairs)) => OrderQuery::from_pairs(pairs),
        Err(rejection) => {
            tracing::debug!(trace_id = %ctx.trace_id, error = %rejection, "Malformed order query");
            OrderQuery {
                order_id: Some(String::new()),
                error: None,
            }
        }
    };

    let request = OrderRequest::from(query);
    state.orders.process(&ctx, &request).await.map(Json)
}

/// `GET /metrics`
pub async fn export_metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        state.telemetry.metrics().render(),
    )
}

/// Any unrouted path.
pub async fn fallback() -> Response {
    not_found()
}
