//! Registry of services currently executing.
//!
//! Observability only: the pipeline never reads it to make decisions.
//! Entries are keyed by run id and service so concurrent scans of the same
//! provider do not collide.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Identifier of one pipeline run.
pub type RunId = u64;

struct ServiceEntry {
    provider: String,
    check_ids: Vec<String>,
    started_at: Instant,
}

/// Point-in-time view of one executing service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExecutingService {
    pub run_id: RunId,
    pub provider: String,
    pub service: String,
    pub check_ids: Vec<String>,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }
}

/// Shared map of (run, service) → executing check ids.
#[derive(Default)]
pub struct ServiceRegistry {
    entries: DashMap<(RunId, String), ServiceEntry>,
    next_run_id: AtomicU64,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh run id.
    pub fn next_run(&self) -> RunId {
        self.next_run_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Registers a service and returns a guard that removes it on drop.
    pub fn register(
        self: &Arc<Self>,
        run_id: RunId,
        provider: &str,
        service: &str,
        check_ids: &[String],
    ) -> RegistrationGuard {
        self.entries.insert(
            (run_id, service.to_string()),
            ServiceEntry {
                provider: provider.to_string(),
                check_ids: check_ids.to_vec(),
                started_at: Instant::now(),
            },
        );
        RegistrationGuard {
            registry: Arc::clone(self),
            key: (run_id, service.to_string()),
        }
    }

    pub fn contains(&self, run_id: RunId, service: &str) -> bool {
        self.entries.contains_key(&(run_id, service.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of all executing services, ordered by run then service.
    pub fn snapshot(&self) -> Vec<ExecutingService> {
        let mut services: Vec<ExecutingService> = self
            .entries
            .iter()
            .map(|entry| {
                let (run_id, service) = entry.key();
                let value = entry.value();
                ExecutingService {
                    run_id: *run_id,
                    provider: value.provider.clone(),
                    service: service.clone(),
                    check_ids: value.check_ids.clone(),
                    elapsed: value.started_at.elapsed(),
                }
            })
            .collect();
        services.sort_by(|a, b| (a.run_id, &a.service).cmp(&(b.run_id, &b.service)));
        services
    }
}

/// Removes a service from the registry when dropped.
pub struct RegistrationGuard {
    registry: Arc<ServiceRegistry>,
    key: (RunId, String),
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        self.registry.entries.remove(&self.key);
    }
}
