//! Failure simulator for root-cause-analysis training.
//!
//! Serves a tiny order API whose simulated dependencies (a database and a
//! third-party API) randomly go down, producing realistic metrics, structured
//! logs and optional cluster events.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod orders;

pub use config::SimConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use observability::Telemetry;
