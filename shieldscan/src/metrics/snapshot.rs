//! Point-in-time metrics view and its text renderings.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Immutable copy of the registry counters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_checks_executed: u64,
    pub failed_checks: u64,
    pub cumulative_duration_secs: f64,
    pub average_duration_secs: f64,
    pub active_workers: usize,
    pub peak_active_workers: usize,
}

impl MetricsSnapshot {
    /// Renders the snapshot in the Prometheus text exposition format.
    pub fn to_prometheus(&self) -> String {
        let mut out = String::new();
        write_metric(
            &mut out,
            "engine_total_checks_executed",
            "counter",
            "Total number of check executions.",
            self.total_checks_executed.to_string(),
        );
        write_metric(
            &mut out,
            "engine_failed_checks_count",
            "counter",
            "Number of check executions that failed or timed out.",
            self.failed_checks.to_string(),
        );
        write_metric(
            &mut out,
            "engine_average_check_execution_time_seconds",
            "gauge",
            "Average check execution time in seconds.",
            format!("{:.6}", self.average_duration_secs),
        );
        write_metric(
            &mut out,
            "engine_active_worker_count",
            "gauge",
            "Checks currently executing.",
            self.active_workers.to_string(),
        );
        out
    }
}

fn write_metric(out: &mut String, name: &str, kind: &str, help: &str, value: String) {
    // Writing to a String cannot fail.
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} {kind}");
    let _ = writeln!(out, "{name} {value}");
}
