//! Scan engine facade.
//!
//! [`ScanEngine`] owns the process-wide pieces: one metrics registry, one
//! job queue and one pipeline. Requests go through the queue so that at
//! most `queue_workers` scans run at once, and each request is bounded by
//! the per-request timeout, which includes time spent waiting in the queue.
//!
//! ```text
//!   submit(request) ── request timeout ──► JobQueue ──► ScanPipeline::run ──► Vec<CheckResult>
//!                                             │                 │
//!                                             │                 └──► EngineMetrics
//!                                             └──► queue_depth()
//! ```
//!
//! # Example
//!
//! ```ignore
//! use shieldscan::backend::DirectoryBackend;
//! use shieldscan::check::ScanRequest;
//! use shieldscan::config::EnginePolicy;
//! use shieldscan::engine::ScanEngine;
//!
//! let engine = ScanEngine::new(EnginePolicy::default(), DirectoryBackend::new("/opt/catalog"));
//! engine.start();
//! let results = engine.submit(ScanRequest::new("aws")).await?;
//! engine.stop().await;
//! ```

mod compatibility;
mod health;

pub use compatibility::{
    validate_compatibility, CompatibilityBaselines, CompatibilityReport, REQUIRED_METADATA_FIELDS,
};
pub use health::{HealthReport, HealthStatus};

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::backend::ScanBackend;
use crate::check::{CheckResult, ScanRequest};
use crate::config::EnginePolicy;
use crate::metrics::{EngineMetrics, MetricsSnapshot};
use crate::pipeline::{ExecutingService, ScanPipeline};
use crate::queue::{JobQueue, QueueError};

/// Errors returned by [`ScanEngine::submit`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("scan request timed out after {0:?}")]
    RequestTimeout(Duration),
}

/// The process-level scan engine.
pub struct ScanEngine<B: ScanBackend> {
    pipeline: Arc<ScanPipeline<B>>,
    queue: JobQueue<Vec<CheckResult>>,
    metrics: Arc<EngineMetrics>,
    policy: EnginePolicy,
    baselines: CompatibilityBaselines,
    compatibility: Mutex<Option<CompatibilityReport>>,
}

impl<B: ScanBackend> ScanEngine<B> {
    /// Creates a stopped engine. `policy` is validated first.
    pub fn new(policy: EnginePolicy, backend: B) -> Self {
        let policy = policy.validated();
        let metrics = EngineMetrics::shared();
        let pipeline = Arc::new(ScanPipeline::new(
            Arc::new(backend),
            policy,
            Arc::clone(&metrics),
        ));
        Self {
            pipeline,
            queue: JobQueue::new("scan", policy.queue_capacity, policy.queue_workers),
            metrics,
            policy,
            baselines: CompatibilityBaselines::default(),
            compatibility: Mutex::new(None),
        }
    }

    /// Sets the baselines used by [`health`](Self::health).
    pub fn with_baselines(mut self, baselines: CompatibilityBaselines) -> Self {
        self.baselines = baselines;
        self
    }

    /// Starts the request workers. Idempotent.
    pub fn start(&self) {
        self.queue.start();
    }

    /// Stops the request workers, failing queued requests. Idempotent.
    pub async fn stop(&self) {
        self.queue.stop().await;
    }

    /// Runs a scan through the queue, bounded by the request timeout.
    pub async fn submit(&self, request: ScanRequest) -> Result<Vec<CheckResult>, EngineError> {
        let provider = request.provider.clone();
        let pipeline = Arc::clone(&self.pipeline);
        let job = self
            .queue
            .submit(move |cancel| async move { pipeline.run(&request, &cancel).await });

        match tokio::time::timeout(self.policy.request_timeout, job).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                warn!(
                    provider = %provider,
                    timeout_secs = self.policy.request_timeout.as_secs_f64(),
                    "Scan request timed out"
                );
                Err(EngineError::RequestTimeout(self.policy.request_timeout))
            }
        }
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Requests waiting for a queue worker.
    pub fn queue_depth(&self) -> usize {
        self.queue.size()
    }

    pub fn executing_services(&self) -> Vec<ExecutingService> {
        self.pipeline.registry().snapshot()
    }

    pub fn policy(&self) -> &EnginePolicy {
        &self.policy
    }

    pub fn backend(&self) -> &Arc<B> {
        self.pipeline.backend()
    }

    /// Validates the catalog and caches the report for [`health`](Self::health).
    pub async fn validate_compatibility(&self) -> CompatibilityReport {
        let backend = Arc::clone(self.pipeline.backend());
        let baselines = self.baselines;
        let report = tokio::task::spawn_blocking(move || validate_compatibility(&*backend, baselines))
            .await
            .unwrap_or_else(|e| CompatibilityReport {
                warnings: vec![format!("compatibility validation failed: {e}")],
                ..CompatibilityReport::default()
            });
        *self.compatibility.lock() = Some(report.clone());
        report
    }

    /// Current health. Validates the catalog on first call.
    pub async fn health(&self) -> HealthReport {
        let cached = self.compatibility.lock().clone();
        let compatibility = match cached {
            Some(report) => report,
            None => self.validate_compatibility().await,
        };
        let report = HealthReport::new(self.queue_depth(), self.metrics_snapshot(), compatibility);
        debug!(status = ?report.status, queue_size = report.queue_size, "Health check");
        report
    }
}
