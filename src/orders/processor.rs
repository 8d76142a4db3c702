//! Order processing with simulated dependency failures.
//!
//! # Decision order (first match wins)
//! ```text
//! order_id empty or "invalid"            → ValidationError
//! db down        or error=db             → DatabaseConnectionError
//! third party down or error=api_timeout  → ThirdPartyTimeout
//! otherwise: sleep [min, max) latency    → processed
//! fault state unreadable                 → UnexpectedError
//! ```
//!
//! Every classified error is counted, logged with a stack capture and, unless
//! it is a validation error, reported as a cluster event before returning.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::config::ProcessingConfig;
use crate::health::state::FaultState;
use crate::http::request::RequestContext;
use crate::observability::events::ClusterEvent;
use crate::observability::logging::{DiagnosticRecord, Severity};
use crate::observability::Telemetry;
use crate::orders::types::{OrderError, OrderRequest, OrderResult, SimulatedError};

/// Endpoint label for order metrics.
pub const ENDPOINT: &str = "process_order";

pub struct OrderProcessor {
    faults: Arc<FaultState>,
    telemetry: Telemetry,
    min_latency: Duration,
    max_latency: Duration,
}

impl OrderProcessor {
    pub fn new(faults: Arc<FaultState>, telemetry: Telemetry, config: &ProcessingConfig) -> Self {
        Self {
            faults,
            telemetry,
            min_latency: Duration::from_millis(config.min_latency_ms),
            max_latency: Duration::from_millis(config.max_latency_ms),
        }
    }

    /// Process one order, reporting any classified failure before returning it.
    pub async fn process(
        &self,
        ctx: &RequestContext,
        request: &OrderRequest,
    ) -> Result<OrderResult, OrderError> {
        match self.execute(ctx, request).await {
            Ok(result) => {
                tracing::debug!(trace_id = %ctx.trace_id, order_id = %request.order_id, "Order processed");
                Ok(result)
            }
            Err(err) => {
                self.report_failure(ctx, request, &err);
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        ctx: &RequestContext,
        request: &OrderRequest,
    ) -> Result<OrderResult, OrderError> {
        if !request.is_valid_id() {
            return Err(OrderError::Validation);
        }

        let flags = self
            .faults
            .snapshot()
            .map_err(|e| OrderError::Unexpected(e.to_string()))?;

        if !flags.db_connected || request.simulated_error == Some(SimulatedError::Db) {
            return Err(OrderError::DatabaseConnection);
        }

        if !flags.third_party_available
            || request.simulated_error == Some(SimulatedError::ApiTimeout)
        {
            return Err(OrderError::ThirdPartyTimeout);
        }

        tokio::time::sleep(self.sample_latency()).await;

        Ok(OrderResult::processed(ctx.trace_id, request.order_id.clone()))
    }

    /// Draw a simulated processing delay from `[min_latency, max_latency)`.
    pub fn sample_latency(&self) -> Duration {
        if self.min_latency >= self.max_latency {
            return self.min_latency;
        }
        rand::thread_rng().gen_range(self.min_latency..self.max_latency)
    }

    fn report_failure(&self, ctx: &RequestContext, request: &OrderRequest, err: &OrderError) {
        let error_type = err.error_type();
        let trace_id = ctx.trace_id.to_string();

        self.telemetry
            .record_error(error_type, ENDPOINT, &request.order_id, &trace_id);

        let severity = match err {
            OrderError::Unexpected(_) => Severity::Critical,
            _ => Severity::Error,
        };
        self.telemetry.log_diagnostic(&DiagnosticRecord::new(
            severity,
            trace_id.as_str(),
            error_type,
            err.to_string(),
            request.order_id.as_str(),
        ));

        if err.warrants_cluster_event() {
            self.telemetry.emit_cluster_event(ClusterEvent::warning(
                error_type,
                format!("order {} (trace {}): {}", request.order_id, trace_id, err),
            ));
        }
    }
}
