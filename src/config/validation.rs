//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges. All errors are
//! collected rather than stopping at the first one.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::SimConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must be within [0, 1], got {value}")]
    ProbabilityOutOfRange { field: &'static str, value: f64 },

    #[error("processing.min_latency_ms ({min}) must be less than processing.max_latency_ms ({max})")]
    EmptyLatencyRange { min: u64, max: u64 },

    #[error("listener.bind_address '{0}' is not a socket address")]
    InvalidBindAddress(String),

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,
}

/// Validate a configuration, returning every problem found.
pub fn validate_config(config: &SimConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let probabilities = [
        ("faults.db_flip_probability", config.faults.db_flip_probability),
        (
            "faults.third_party_flip_probability",
            config.faults.third_party_flip_probability,
        ),
    ];
    for (field, value) in probabilities {
        if !(0.0..=1.0).contains(&value) {
            errors.push(ValidationError::ProbabilityOutOfRange { field, value });
        }
    }

    let processing = &config.processing;
    if processing.min_latency_ms >= processing.max_latency_ms {
        errors.push(ValidationError::EmptyLatencyRange {
            min: processing.min_latency_ms,
            max: processing.max_latency_ms,
        });
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
