//! Engine metrics registry.
//!
//! A single [`EngineMetrics`] instance is shared (via `Arc`) by every check
//! execution in the process. All counters live behind one lock so a
//! [`MetricsSnapshot`] is always internally consistent.
//!
//! ```text
//!   execute_check ──┬── active_guard()  ──► active += 1 ... drop ► active -= 1
//!                   └── record_check()  ──► total, failed, cumulative
//!
//!   engine.metrics_snapshot() ──► MetricsSnapshot ──► JSON / Prometheus text
//! ```
//!
//! The registry is injected rather than global, so tests can assert on an
//! isolated instance.

mod snapshot;

pub use snapshot::MetricsSnapshot;

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct MetricsState {
    total_checks: u64,
    failed_checks: u64,
    cumulative: Duration,
    active_workers: usize,
    peak_active_workers: usize,
}

/// Thread-safe counters for check execution.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    state: Mutex<MetricsState>,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry wrapped in an `Arc` for sharing.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn increment_active(&self) {
        let mut state = self.state.lock();
        state.active_workers += 1;
        if state.active_workers > state.peak_active_workers {
            state.peak_active_workers = state.active_workers;
        }
    }

    /// Decrements the active worker count, never going below zero.
    pub fn decrement_active(&self) {
        let mut state = self.state.lock();
        state.active_workers = state.active_workers.saturating_sub(1);
    }

    /// Records one finished check execution.
    pub fn record_check(&self, duration: Duration, failed: bool) {
        let mut state = self.state.lock();
        state.total_checks += 1;
        state.cumulative += duration;
        if failed {
            state.failed_checks += 1;
        }
    }

    /// Marks a worker active until the returned guard is dropped.
    pub fn active_guard(&self) -> ActiveWorkerGuard<'_> {
        self.increment_active();
        ActiveWorkerGuard { metrics: self }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let state = self.state.lock();
        let average = if state.total_checks == 0 {
            Duration::ZERO
        } else {
            state.cumulative.div_f64(state.total_checks as f64)
        };
        MetricsSnapshot {
            total_checks_executed: state.total_checks,
            failed_checks: state.failed_checks,
            cumulative_duration_secs: state.cumulative.as_secs_f64(),
            average_duration_secs: average.as_secs_f64(),
            active_workers: state.active_workers,
            peak_active_workers: state.peak_active_workers,
        }
    }
}

/// RAII guard returned by [`EngineMetrics::active_guard`].
#[derive(Debug)]
pub struct ActiveWorkerGuard<'a> {
    metrics: &'a EngineMetrics,
}

impl Drop for ActiveWorkerGuard<'_> {
    fn drop(&mut self) {
        self.metrics.decrement_active();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot_has_zero_average() {
        let snapshot = EngineMetrics::new().snapshot();
        assert_eq!(snapshot.total_checks_executed, 0);
        assert_eq!(snapshot.average_duration_secs, 0.0);
    }

    #[test]
    fn test_record_check_accumulates() {
        let metrics = EngineMetrics::new();
        metrics.record_check(Duration::from_millis(100), false);
        metrics.record_check(Duration::from_millis(300), true);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_checks_executed, 2);
        assert_eq!(snapshot.failed_checks, 1);
        assert!((snapshot.cumulative_duration_secs - 0.4).abs() < 1e-9);
        assert!((snapshot.average_duration_secs - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_decrement_floors_at_zero() {
        let metrics = EngineMetrics::new();
        metrics.decrement_active();
        metrics.increment_active();
        metrics.decrement_active();
        metrics.decrement_active();
        assert_eq!(metrics.snapshot().active_workers, 0);
    }

    #[test]
    fn test_active_guard_tracks_peak() {
        let metrics = EngineMetrics::new();
        {
            let _a = metrics.active_guard();
            let _b = metrics.active_guard();
            assert_eq!(metrics.snapshot().active_workers, 2);
        }
        let _c = metrics.active_guard();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.active_workers, 1);
        assert_eq!(snapshot.peak_active_workers, 2);
    }

    #[test]
    fn test_concurrent_recording() {
        let metrics = EngineMetrics::shared();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let metrics = Arc::clone(&metrics);
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        let _guard = metrics.active_guard();
                        metrics.record_check(Duration::from_micros(10), i % 2 == 0);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_checks_executed, 2000);
        assert_eq!(snapshot.failed_checks, 1000);
        assert_eq!(snapshot.active_workers, 0);
        assert!(snapshot.peak_active_workers <= 8);
    }
}
