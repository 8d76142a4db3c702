//! Simulated dependency health.
//!
//! # Data Flow
//! ```text
//! GET /health
//!     → report.rs (HealthReporter::report)
//!     → state.rs (random flips under lock)
//!     → gauges published, status derived
//!
//! GET /process_order
//!     → state.rs (read-only snapshot)
//! ```
//!
//! # Design Decisions
//! - Only health checks mutate fault state
//! - State is an owned object shared via Arc, not a global
//! - One mutex guards both flags; flips are never half-visible

pub mod report;
pub mod state;

pub use report::{HealthReport, HealthReporter, HealthStatus};
pub use state::{FaultFlags, FaultState, FaultStateError};
