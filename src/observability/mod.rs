//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Middleware and handlers produce:
//!     → metrics.rs (counters, gauges, histograms)
//!     → logging.rs (access log + diagnostic records)
//!     → events.rs (cluster events, best effort)
//!
//! Consumers:
//!     → GET /metrics (Prometheus scrape)
//!     → stdout (JSON lines for log aggregation)
//!     → Kubernetes event API (optional)
//! ```
//!
//! # Design Decisions
//! - Trace ID flows through logs, error labels and responses
//! - Metrics live in a per-instance recorder, not a global one
//! - Diagnostic emission may fail silently; the response path never waits on it

pub mod emitter;
pub mod events;
pub mod logging;
pub mod metrics;

pub use emitter::Telemetry;
