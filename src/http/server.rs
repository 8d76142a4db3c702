//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the shared fault state and the services built on it
//! - Create the Axum Router with all handlers
//! - Wire up middleware (instrumentation, timeout, tracing)
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::SimConfig;
use crate::health::{FaultState, HealthReporter};
use crate::http::handlers;
use crate::http::middleware::instrument;
use crate::observability::Telemetry;
use crate::orders::OrderProcessor;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub health: Arc<HealthReporter>,
    pub orders: Arc<OrderProcessor>,
    pub telemetry: Telemetry,
}

/// HTTP server for the failure simulator.
pub struct HttpServer {
    router: Router,
    config: SimConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: SimConfig, telemetry: Telemetry) -> Self {
        let faults = Arc::new(FaultState::new(&config.faults));

        let state = AppState {
            health: Arc::new(HealthReporter::new(faults.clone(), telemetry.clone())),
            orders: Arc::new(OrderProcessor::new(
                faults,
                telemetry.clone(),
                &config.processing,
            )),
            telemetry,
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The timeout sits inside `instrument`, so a timed-out request is still
    /// counted and logged with its 408.
    #[allow(deprecated)]
    fn build_router(config: &SimConfig, state: AppState) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/process_order", get(handlers::process_order))
            .route("/metrics", get(handlers::export_metrics))
            .fallback(handlers::fallback)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::from_fn_with_state(state.clone(), instrument))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// A clone of the fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            db_flip_probability = self.config.faults.db_flip_probability,
            third_party_flip_probability = self.config.faults.third_party_flip_probability,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
