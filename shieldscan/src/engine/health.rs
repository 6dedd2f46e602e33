//! Health reporting.

use serde::{Deserialize, Serialize};

use super::compatibility::CompatibilityReport;
use crate::metrics::MetricsSnapshot;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    /// The engine runs, but the catalog failed compatibility validation.
    Degraded,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub queue_size: usize,
    pub metrics: MetricsSnapshot,
    pub compatibility: CompatibilityReport,
}

impl HealthReport {
    pub fn new(queue_size: usize, metrics: MetricsSnapshot, compatibility: CompatibilityReport) -> Self {
        let status = if compatibility.is_clean() {
            HealthStatus::Ok
        } else {
            HealthStatus::Degraded
        };
        Self {
            status,
            queue_size,
            metrics,
            compatibility,
        }
    }
}
