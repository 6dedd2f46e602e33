//! Batched execution of one service group.

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::check::execute_check;
use super::runner::RunScope;
use crate::backend::ScanBackend;
use crate::check::CheckResult;
use crate::executor::BlockingPool;

/// Runs every check of `service`, batch by batch.
///
/// Batches run sequentially; checks within a batch run concurrently,
/// bounded by the run-wide limiter. The service's pool is scoped to the
/// run's pool, so check bodies abandoned by an earlier service still hold
/// their slots. The pool, registry entry and cancellation token are torn
/// down when this future completes or is dropped by an enclosing timeout.
pub(crate) async fn run_service<B: ScanBackend>(
    scope: &RunScope<B>,
    service: &str,
    check_ids: &[String],
    parent: &CancellationToken,
) -> Vec<CheckResult> {
    let cancel = parent.child_token();
    let _cancel_on_exit = cancel.clone().drop_guard();
    let _registration = scope
        .registry
        .register(scope.run_id, &scope.provider, service, check_ids);
    let pool = scope
        .pool
        .scoped(format!("{}:{}", scope.provider, service));

    let batch_size = scope.policy.batch_size.max(1);
    let batch_count = check_ids.len().div_ceil(batch_size);
    let mut results = Vec::with_capacity(check_ids.len());

    for (index, batch) in check_ids.chunks(batch_size).enumerate() {
        debug!(
            service,
            batch = index + 1,
            batches = batch_count,
            checks = batch.len(),
            "Running check batch"
        );
        let batch_results = join_all(
            batch
                .iter()
                .map(|check_id| execute_check(scope, &pool, service, check_id, &cancel)),
        )
        .await;
        results.extend(batch_results.into_iter().flatten());
    }

    pool.shutdown();
    results
}
