//! Aggregate health reporting.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::health::state::{FaultFlags, FaultState, FaultStateError};
use crate::observability::Telemetry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

/// Body of `GET /health`.
///
/// `details` names each degraded dependency and is empty when healthy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub details: BTreeMap<&'static str, &'static str>,
}

impl HealthReport {
    pub fn from_flags(flags: FaultFlags) -> Self {
        let mut details = BTreeMap::new();
        if !flags.db_connected {
            details.insert("db", "Connection lost");
        }
        if !flags.third_party_available {
            details.insert("third_party_api", "Service unreachable");
        }

        let status = if flags.all_up() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };

        Self { status, details }
    }
}

/// Runs a health check: flips fault state, publishes gauges, summarizes.
pub struct HealthReporter {
    faults: Arc<FaultState>,
    telemetry: Telemetry,
}

impl HealthReporter {
    pub fn new(faults: Arc<FaultState>, telemetry: Telemetry) -> Self {
        Self { faults, telemetry }
    }

    pub fn report(&self) -> Result<HealthReport, FaultStateError> {
        let flags = self.faults.check_and_maybe_flip()?;
        self.telemetry.set_dependency_gauges(flags);

        let report = HealthReport::from_flags(flags);
        if report.status == HealthStatus::Degraded {
            tracing::warn!(
                db_connected = flags.db_connected,
                third_party_available = flags.third_party_available,
                "Health check degraded"
            );
        }
        Ok(report)
    }
}
