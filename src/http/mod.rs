//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layers)
//!     → middleware/instrument.rs (RequestContext, trace ID)
//!     → handlers.rs (health, process_order, metrics, fallback)
//!     → response.rs (error classification → status + JSON)
//!     → middleware/instrument.rs (metrics, access log)
//!     → Send to client
//! ```

pub mod handlers;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestContext, TraceId, X_TRACE_ID};
pub use server::{AppState, HttpServer};
