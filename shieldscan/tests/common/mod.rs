//! In-memory scan backend shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use shieldscan::backend::{BackendError, Check, CheckError, ScanBackend};
use shieldscan::check::{ComplianceTable, RawFinding, ScanRequest};
use shieldscan::config::{DiscoveryPolicy, EnginePolicy};

/// Upper bound on how long a hung check blocks if nobody cancels it.
const HANG_LIMIT: Duration = Duration::from_secs(10);

/// What a mock check does when executed.
#[derive(Clone, Copy, Debug)]
pub enum Behavior {
    /// Sleep for the given milliseconds, then report one PASS finding.
    Pass(u64),
    /// Report one FAIL/critical finding.
    Fail,
    /// Block until cancelled.
    Hang,
    /// Sleep for the given milliseconds ignoring cancellation, then PASS.
    Stubborn(u64),
    /// Return an execution error.
    Error,
}

/// Counters observed by the tests.
#[derive(Debug, Default)]
pub struct Stats {
    pub running: AtomicUsize,
    pub peak: AtomicUsize,
    pub executed: AtomicUsize,
    pub cancelled: AtomicUsize,
    pub discovery_calls: AtomicUsize,
}

struct MockCheck {
    check_id: String,
    service: String,
    behavior: Behavior,
    stats: Arc<Stats>,
}

impl MockCheck {
    fn finding(&self, status: &str, severity: &str) -> RawFinding {
        RawFinding::new(status)
            .with_check(&self.check_id, &self.service)
            .with_severity(severity)
            .with_resource(format!("res-{}", self.check_id))
    }
}

impl Check<()> for MockCheck {
    fn execute(&self, _ctx: &(), cancel: &CancellationToken) -> Result<Vec<RawFinding>, CheckError> {
        let now = self.stats.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.peak.fetch_max(now, Ordering::SeqCst);
        self.stats.executed.fetch_add(1, Ordering::SeqCst);

        let outcome = match self.behavior {
            Behavior::Pass(delay_ms) => {
                std::thread::sleep(Duration::from_millis(delay_ms));
                Ok(vec![self.finding("PASS", "low")])
            }
            Behavior::Stubborn(delay_ms) => {
                std::thread::sleep(Duration::from_millis(delay_ms));
                Ok(vec![self.finding("PASS", "low")])
            }
            Behavior::Fail => Ok(vec![self.finding("FAIL", "critical")]),
            Behavior::Hang => {
                let started = Instant::now();
                while !cancel.is_cancelled() && started.elapsed() < HANG_LIMIT {
                    std::thread::sleep(Duration::from_millis(5));
                }
                if cancel.is_cancelled() {
                    self.stats.cancelled.fetch_add(1, Ordering::SeqCst);
                }
                Err(CheckError::Cancelled)
            }
            Behavior::Error => Err(CheckError::Failed("simulated API outage".to_string())),
        };

        self.stats.running.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

/// A backend whose services and checks are declared up front.
pub struct MockBackend {
    services: Vec<(String, Vec<(String, Behavior)>)>,
    compliance: ComplianceTable,
    context_error: Option<String>,
    discovery_delay: Duration,
    pub stats: Arc<Stats>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            services: Vec::new(),
            compliance: ComplianceTable::new(),
            context_error: None,
            discovery_delay: Duration::ZERO,
            stats: Arc::new(Stats::default()),
        }
    }

    /// Adds a service. Check ids should start with `<service>_`.
    pub fn with_service(mut self, service: &str, checks: &[(&str, Behavior)]) -> Self {
        let checks = checks
            .iter()
            .map(|(id, behavior)| (id.to_string(), *behavior))
            .collect();
        self.services.push((service.to_string(), checks));
        self
    }

    pub fn with_compliance(mut self, compliance: ComplianceTable) -> Self {
        self.compliance = compliance;
        self
    }

    pub fn with_context_error(mut self, cause: &str) -> Self {
        self.context_error = Some(cause.to_string());
        self
    }

    /// Makes every discovery call block for `delay`.
    pub fn with_discovery_delay(mut self, delay: Duration) -> Self {
        self.discovery_delay = delay;
        self
    }

    pub fn stats(&self) -> Arc<Stats> {
        Arc::clone(&self.stats)
    }
}

impl ScanBackend for MockBackend {
    type Context = ();

    fn list_services(&self, _provider: &str) -> Result<Vec<String>, BackendError> {
        Ok(self.services.iter().map(|(name, _)| name.clone()).collect())
    }

    fn discover_service_checks(
        &self,
        provider: &str,
        service: &str,
    ) -> Result<Vec<String>, BackendError> {
        self.stats.discovery_calls.fetch_add(1, Ordering::SeqCst);
        if !self.discovery_delay.is_zero() {
            std::thread::sleep(self.discovery_delay);
        }
        self.services
            .iter()
            .find(|(name, _)| name == service)
            .map(|(_, checks)| checks.iter().map(|(id, _)| id.clone()).collect())
            .ok_or_else(|| BackendError::ServiceNotFound {
                provider: provider.to_string(),
                service: service.to_string(),
            })
    }

    fn resolve_check(&self, _provider: &str, check_id: &str) -> Option<Arc<dyn Check<()>>> {
        self.services.iter().find_map(|(service, checks)| {
            checks
                .iter()
                .find(|(id, _)| id == check_id)
                .map(|(id, behavior)| {
                    Arc::new(MockCheck {
                        check_id: id.clone(),
                        service: service.clone(),
                        behavior: *behavior,
                        stats: Arc::clone(&self.stats),
                    }) as Arc<dyn Check<()>>
                })
        })
    }

    fn build_context(&self, _request: &ScanRequest) -> Result<(), BackendError> {
        match &self.context_error {
            Some(cause) => Err(BackendError::Context(cause.clone())),
            None => Ok(()),
        }
    }

    fn compliance_table(&self, _provider: &str) -> ComplianceTable {
        self.compliance.clone()
    }
}

/// A policy with generous timeouts and fast discovery retries.
pub fn test_policy() -> EnginePolicy {
    EnginePolicy {
        max_workers: 4,
        check_timeout: Duration::from_secs(5),
        service_timeout: Duration::from_secs(10),
        global_timeout: Duration::from_secs(20),
        request_timeout: Duration::from_secs(30),
        batch_size: 10,
        discovery: DiscoveryPolicy {
            timeout: Duration::from_secs(2),
            retry_count: 0,
            backoff_base: Duration::from_millis(1),
        },
        queue_capacity: 8,
        queue_workers: 2,
    }
}
