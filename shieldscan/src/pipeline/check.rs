//! Single check execution.

use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::runner::RunScope;
use crate::backend::ScanBackend;
use crate::check::{
    extract_compliance_from_finding, CheckResult, CHECK_ERROR_PREFIX, CHECK_TIMEOUT_MESSAGE,
};
use crate::executor::BlockingPool;

/// Runs one check and returns its normalized results.
///
/// Produces exactly one of:
/// - the normalized findings (possibly empty),
/// - an empty list when the check id cannot be resolved,
/// - a single FAIL placeholder on timeout or execution error.
///
/// The check timeout starts once the check has both a limiter permit and a
/// slot on `pool`. Every path past admission records one metrics sample and
/// releases its limiter permit.
pub(crate) async fn execute_check<B: ScanBackend>(
    scope: &RunScope<B>,
    pool: &BlockingPool,
    service: &str,
    check_id: &str,
    parent: &CancellationToken,
) -> Vec<CheckResult> {
    let Ok(_permit) = scope.limiter.acquire(parent).await else {
        // The enclosing service or run was cancelled before this check started.
        return Vec::new();
    };
    let slot = tokio::select! {
        biased;
        _ = parent.cancelled() => return Vec::new(),
        slot = pool.acquire() => match slot {
            Ok(slot) => slot,
            Err(e) => {
                debug!(service, check_id, error = %e, "Check not admitted");
                return Vec::new();
            }
        },
    };
    let _active = scope.metrics.active_guard();

    let cancel = parent.child_token();
    let _cancel_on_exit = cancel.clone().drop_guard();
    let started = Instant::now();

    let call = {
        let backend = Arc::clone(&scope.backend);
        let context = Arc::clone(&scope.context);
        let provider = scope.provider.clone();
        let check_id = check_id.to_string();
        let cancel = cancel.clone();
        slot.run(move || {
            backend
                .resolve_check(&provider, &check_id)
                .map(|check| check.execute(&context, &cancel))
        })
    };

    let outcome = tokio::time::timeout(scope.policy.check_timeout, call).await;
    let elapsed = started.elapsed();

    let error = match outcome {
        Ok(Ok(Some(Ok(findings)))) => {
            let results: Vec<CheckResult> = findings
                .iter()
                .map(|finding| {
                    let mut tags = extract_compliance_from_finding(finding);
                    if tags.is_empty() {
                        tags = scope.compliance.tags_for(check_id);
                    }
                    let mut result = scope
                        .backend
                        .normalize_finding(finding, &scope.provider, tags);
                    if result.check_id.is_empty() {
                        result.check_id = check_id.to_string();
                    }
                    if result.service.is_empty() {
                        result.service = service.to_string();
                    }
                    result
                })
                .collect();

            let failed = results.iter().any(CheckResult::is_fail);
            scope.metrics.record_check(elapsed, failed);
            info!(
                service,
                check_id,
                findings = results.len(),
                failed,
                elapsed_ms = elapsed.as_millis() as u64,
                "Check complete"
            );
            return results;
        }
        Ok(Ok(None)) => {
            scope.metrics.record_check(elapsed, true);
            debug!(service, check_id, "Check could not be resolved; skipping");
            return Vec::new();
        }
        Ok(Ok(Some(Err(e)))) => e.to_string(),
        Ok(Err(e)) => e.to_string(),
        Err(_) => {
            cancel.cancel();
            scope.metrics.record_check(elapsed, true);
            warn!(
                service,
                check_id,
                timeout_secs = scope.policy.check_timeout.as_secs_f64(),
                "Check timed out"
            );
            return vec![CheckResult::placeholder(
                &scope.provider,
                service,
                check_id,
                CHECK_TIMEOUT_MESSAGE,
            )];
        }
    };

    scope.metrics.record_check(elapsed, true);
    warn!(service, check_id, error = %error, "Check execution failed");
    vec![CheckResult::placeholder(
        &scope.provider,
        service,
        check_id,
        &format!("{CHECK_ERROR_PREFIX}: {error}"),
    )]
}
