//! Client for the metric-sim HTTP API.

mod client;

pub use client::{HealthResponse, OrderOutcome, SimClient};
