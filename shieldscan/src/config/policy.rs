//! Immutable runtime policy derived from configuration.

use std::time::Duration;

use super::defaults::*;
use super::settings::ConfigFile;

/// Discovery retry parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiscoveryPolicy {
    /// Timeout per attempt.
    pub timeout: Duration,
    /// Additional attempts after the first.
    pub retry_count: u32,
    /// Sleep before attempt `n + 1` is `backoff_base * n`.
    pub backoff_base: Duration,
}

impl Default for DiscoveryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_DISCOVERY_TIMEOUT_SECS),
            retry_count: DEFAULT_DISCOVERY_RETRY_COUNT,
            backoff_base: Duration::from_millis(DEFAULT_DISCOVERY_BACKOFF_MS),
        }
    }
}

/// Numeric limits governing one engine instance.
///
/// Built once at startup and shared read-only for the process lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnginePolicy {
    pub max_workers: usize,
    pub check_timeout: Duration,
    pub service_timeout: Duration,
    pub global_timeout: Duration,
    pub request_timeout: Duration,
    pub batch_size: usize,
    pub discovery: DiscoveryPolicy,
    pub queue_capacity: usize,
    pub queue_workers: usize,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            check_timeout: Duration::from_secs(DEFAULT_CHECK_TIMEOUT_SECS),
            service_timeout: Duration::from_secs(DEFAULT_SERVICE_TIMEOUT_SECS),
            global_timeout: Duration::from_secs(DEFAULT_GLOBAL_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            batch_size: DEFAULT_BATCH_SIZE,
            discovery: DiscoveryPolicy::default(),
            queue_capacity: DEFAULT_QUEUE_MAX_SIZE,
            queue_workers: DEFAULT_QUEUE_WORKERS,
        }
    }
}

impl EnginePolicy {
    /// Returns a copy with every count at least 1 and every timeout non-zero.
    pub fn validated(self) -> Self {
        let floor = Duration::from_millis(1);
        Self {
            max_workers: clamp_min("max_workers", self.max_workers),
            check_timeout: self.check_timeout.max(floor),
            service_timeout: self.service_timeout.max(floor),
            global_timeout: self.global_timeout.max(floor),
            request_timeout: self.request_timeout.max(floor),
            batch_size: clamp_min("batch_size", self.batch_size),
            discovery: DiscoveryPolicy {
                timeout: self.discovery.timeout.max(floor),
                ..self.discovery
            },
            queue_capacity: clamp_min("queue_capacity", self.queue_capacity),
            queue_workers: clamp_min("queue_workers", self.queue_workers),
        }
    }
}

impl From<&ConfigFile> for EnginePolicy {
    fn from(config: &ConfigFile) -> Self {
        Self {
            max_workers: config.engine.max_workers,
            check_timeout: Duration::from_secs(config.engine.check_timeout_secs),
            service_timeout: Duration::from_secs(config.engine.service_timeout_secs),
            global_timeout: Duration::from_secs(config.engine.global_timeout_secs),
            request_timeout: Duration::from_secs(config.engine.request_timeout_secs),
            batch_size: config.engine.batch_size,
            discovery: DiscoveryPolicy {
                timeout: Duration::from_secs(config.discovery.timeout_secs),
                retry_count: config.discovery.retry_count,
                backoff_base: Duration::from_millis(config.discovery.backoff_ms),
            },
            queue_capacity: config.queue.max_size,
            queue_workers: config.queue.workers,
        }
        .validated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_default_config_matches_default_policy() {
        let policy = EnginePolicy::from(&ConfigFile::default());
        assert_eq!(policy, EnginePolicy::default());
    }

    #[test]
    fn test_validated_raises_zero_values() {
        let policy = EnginePolicy {
            max_workers: 0,
            batch_size: 0,
            check_timeout: Duration::ZERO,
            queue_workers: 0,
            ..EnginePolicy::default()
        }
        .validated();

        assert_eq!(policy.max_workers, 1);
        assert_eq!(policy.batch_size, 1);
        assert_eq!(policy.queue_workers, 1);
        assert!(policy.check_timeout > Duration::ZERO);
    }

    #[test]
    fn test_config_values_flow_into_policy() {
        let mut config = ConfigFile::default();
        config.engine.max_workers = 2;
        config.engine.check_timeout_secs = 7;
        config.discovery.backoff_ms = 50;

        let policy = EnginePolicy::from(&config);
        assert_eq!(policy.max_workers, 2);
        assert_eq!(policy.check_timeout, Duration::from_secs(7));
        assert_eq!(policy.discovery.backoff_base, Duration::from_millis(50));
    }
}
