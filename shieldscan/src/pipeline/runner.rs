//! Whole-run orchestration.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::registry::{RunId, ServiceRegistry};
use super::service::run_service;
use crate::backend::ScanBackend;
use crate::check::{CheckResult, ComplianceTable, ScanRequest};
use crate::config::EnginePolicy;
use crate::discovery::discover_checks;
use crate::executor::{BlockingPool, ConcurrencyLimiter};
use crate::metrics::EngineMetrics;

/// Everything a run shares between its services and checks.
pub(crate) struct RunScope<B: ScanBackend> {
    pub(crate) run_id: RunId,
    pub(crate) provider: String,
    pub(crate) backend: Arc<B>,
    pub(crate) context: Arc<B::Context>,
    pub(crate) compliance: ComplianceTable,
    pub(crate) limiter: ConcurrencyLimiter,
    pub(crate) pool: BlockingPool,
    pub(crate) policy: EnginePolicy,
    pub(crate) metrics: Arc<EngineMetrics>,
    pub(crate) registry: Arc<ServiceRegistry>,
}

/// Executes scan requests against a backend.
///
/// A pipeline is cheap to share: every [`run`](Self::run) creates its own
/// limiter, blocking pool and cancellation tokens, while the metrics
/// registry and the executing-services registry are shared across runs.
pub struct ScanPipeline<B: ScanBackend> {
    backend: Arc<B>,
    policy: EnginePolicy,
    metrics: Arc<EngineMetrics>,
    registry: Arc<ServiceRegistry>,
}

impl<B: ScanBackend> ScanPipeline<B> {
    pub fn new(backend: Arc<B>, policy: EnginePolicy, metrics: Arc<EngineMetrics>) -> Self {
        Self {
            backend,
            policy,
            metrics,
            registry: Arc::new(ServiceRegistry::new()),
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn policy(&self) -> &EnginePolicy {
        &self.policy
    }

    pub fn metrics(&self) -> &Arc<EngineMetrics> {
        &self.metrics
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    /// Runs one scan to completion.
    ///
    /// Never fails: every fault is folded into the returned results as a
    /// synthetic placeholder. Cancelling `cancel` stops outstanding checks
    /// cooperatively; the results gathered so far are returned.
    pub async fn run(&self, request: &ScanRequest, cancel: &CancellationToken) -> Vec<CheckResult> {
        let run_id = self.registry.next_run();
        let provider = request.provider.clone();
        let started = Instant::now();
        info!(run_id, provider = %provider, "Scan started");

        let context = {
            let backend = Arc::clone(&self.backend);
            let request = request.clone();
            tokio::task::spawn_blocking(move || backend.build_context(&request)).await
        };
        let context = match context {
            Ok(Ok(context)) => Arc::new(context),
            Ok(Err(e)) => {
                error!(run_id, provider = %provider, error = %e, "Provider initialization failed");
                return vec![CheckResult::init_failure(&provider, &e.to_string())];
            }
            Err(e) => {
                error!(run_id, provider = %provider, error = %e, "Provider initialization panicked");
                return vec![CheckResult::init_failure(&provider, &e.to_string())];
            }
        };

        let compliance = {
            let backend = Arc::clone(&self.backend);
            let provider = provider.clone();
            tokio::task::spawn_blocking(move || backend.compliance_table(&provider))
                .await
                .unwrap_or_else(|e| {
                    warn!(run_id, error = %e, "Compliance table loading panicked; continuing without");
                    ComplianceTable::new()
                })
        };

        let scope = RunScope {
            run_id,
            provider: provider.clone(),
            backend: Arc::clone(&self.backend),
            context,
            compliance,
            limiter: ConcurrencyLimiter::new(self.policy.max_workers),
            pool: BlockingPool::new(
                format!("{provider}:run-{run_id}"),
                self.policy.max_workers,
            ),
            policy: self.policy,
            metrics: Arc::clone(&self.metrics),
            registry: Arc::clone(&self.registry),
        };

        let run_cancel = cancel.child_token();
        let _cancel_on_exit = run_cancel.clone().drop_guard();

        let results = match tokio::time::timeout(
            self.policy.global_timeout,
            orchestrate(&scope, request, &run_cancel),
        )
        .await
        {
            Ok(results) => results,
            Err(_) => {
                run_cancel.cancel();
                warn!(
                    run_id,
                    provider = %provider,
                    timeout_secs = self.policy.global_timeout.as_secs_f64(),
                    "Global scan timeout exceeded"
                );
                vec![CheckResult::global_timeout(&provider)]
            }
        };

        info!(
            run_id,
            provider = %provider,
            results = results.len(),
            peak_concurrency = scope.limiter.peak_in_flight(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Scan finished"
        );
        results
    }
}

/// Resolves services, then runs each under the per-service timeout.
async fn orchestrate<B: ScanBackend>(
    scope: &RunScope<B>,
    request: &ScanRequest,
    cancel: &CancellationToken,
) -> Vec<CheckResult> {
    let services = resolve_services(scope, request).await;
    let mut results = Vec::new();

    for (service, check_ids) in services {
        if cancel.is_cancelled() {
            break;
        }
        let outcome = tokio::time::timeout(
            scope.policy.service_timeout,
            run_service(scope, &service, &check_ids, cancel),
        )
        .await;

        match outcome {
            Ok(service_results) => results.extend(service_results),
            Err(_) => {
                warn!(
                    run_id = scope.run_id,
                    service = %service,
                    checks = check_ids.len(),
                    timeout_secs = scope.policy.service_timeout.as_secs_f64(),
                    "Service execution timeout"
                );
                results.push(CheckResult::service_timeout(&scope.provider, &service));
            }
        }
    }
    results
}

/// Produces the ordered (service, check ids) work list.
///
/// Explicit check ids are grouped by derived service. Otherwise every known
/// (or requested) service is discovered concurrently and services without
/// checks are dropped. Discovery does not share the check pool, so a small
/// ceiling never delays an attempt into its timeout.
async fn resolve_services<B: ScanBackend>(
    scope: &RunScope<B>,
    request: &ScanRequest,
) -> Vec<(String, Vec<String>)> {
    if let Some(grouped) = request.group_explicit_checks() {
        return grouped;
    }

    let services = match request.service_filter() {
        Some(filter) => filter.to_vec(),
        None => {
            let backend = Arc::clone(&scope.backend);
            let provider = scope.provider.clone();
            match tokio::task::spawn_blocking(move || backend.list_services(&provider)).await {
                Ok(Ok(services)) => services,
                Ok(Err(e)) => {
                    error!(provider = %scope.provider, error = %e, "Failed to list services");
                    return Vec::new();
                }
                Err(e) => {
                    error!(provider = %scope.provider, error = %e, "Service listing panicked");
                    return Vec::new();
                }
            }
        }
    };

    let discovered = join_all(services.iter().map(|service| {
        discover_checks(
            &scope.backend,
            &scope.provider,
            service,
            &scope.policy.discovery,
        )
    }))
    .await;

    services
        .into_iter()
        .zip(discovered)
        .filter(|(_, checks)| !checks.is_empty())
        .collect()
}
