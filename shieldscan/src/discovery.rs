//! Retry-wrapped check discovery.
//!
//! Listing the checks of a service can involve slow or flaky I/O. Each
//! attempt runs on its own blocking thread and is time-boxed from the moment
//! it starts; failed attempts are
//! retried with a linearly growing backoff. Discovery never fails a scan:
//! once every attempt is exhausted the service simply contributes no checks.
//!
//! ```text
//!   attempt 1 ──✗──► sleep(base × 1) ──► attempt 2 ──✗──► sleep(base × 2) ──► attempt 3 ──✗──► []
//! ```

use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::backend::ScanBackend;
use crate::config::DiscoveryPolicy;

/// Lists the checks of `service`, retrying per `policy`.
///
/// Makes at most `policy.retry_count + 1` attempts. Returns an empty list
/// when all of them fail or time out.
pub async fn discover_checks<B: ScanBackend>(
    backend: &Arc<B>,
    provider: &str,
    service: &str,
    policy: &DiscoveryPolicy,
) -> Vec<String> {
    let attempts = policy.retry_count.saturating_add(1);

    for attempt in 1..=attempts {
        let started = Instant::now();
        let call = {
            let backend = Arc::clone(backend);
            let provider = provider.to_string();
            let service = service.to_string();
            tokio::task::spawn_blocking(move || {
                backend.discover_service_checks(&provider, &service)
            })
        };

        let failure = match tokio::time::timeout(policy.timeout, call).await {
            Ok(Ok(Ok(checks))) => {
                info!(
                    provider,
                    service,
                    attempt,
                    checks = checks.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Discovered service checks"
                );
                return checks;
            }
            Ok(Ok(Err(e))) => e.to_string(),
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("timed out after {:?}", policy.timeout),
        };

        warn!(
            provider,
            service,
            attempt,
            max_attempts = attempts,
            error = %failure,
            "Check discovery attempt failed"
        );

        if attempt < attempts {
            tokio::time::sleep(policy.backoff_base * attempt).await;
        }
    }

    error!(
        provider,
        service,
        attempts,
        "Check discovery exhausted all attempts; skipping service"
    );
    Vec::new()
}
