//! Simulated order processing.
//!
//! # Data Flow
//! ```text
//! GET /process_order?order_id=..&error=..
//!     → types.rs (OrderQuery → OrderRequest)
//!     → processor.rs (validate, consult fault state, simulate latency)
//!     → OrderResult | OrderError (classified, already reported)
//! ```

pub mod processor;
pub mod types;

pub use processor::OrderProcessor;
pub use types::{OrderError, OrderQuery, OrderRequest, OrderResult, SimulatedError};
