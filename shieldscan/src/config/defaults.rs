//! Default values and constants for all configuration settings.
//!
//! Contains all `DEFAULT_*` constants, the minimum-value clamp helper,
//! and the `ConfigFile::default()` implementation.

use super::settings::*;

// =============================================================================
// Engine
// =============================================================================

/// Default ceiling on concurrently executing checks.
pub const DEFAULT_MAX_WORKERS: usize = 8;

/// Default per-check timeout (seconds).
pub const DEFAULT_CHECK_TIMEOUT_SECS: u64 = 45;

/// Default per-service timeout (seconds).
pub const DEFAULT_SERVICE_TIMEOUT_SECS: u64 = 300;

/// Default whole-run timeout (seconds).
pub const DEFAULT_GLOBAL_TIMEOUT_SECS: u64 = 1800;

/// Default per-request timeout (seconds). Slightly above the whole-run
/// timeout so a run's own placeholder normally wins the race.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 1900;

/// Default number of checks per batch.
pub const DEFAULT_BATCH_SIZE: usize = 100;

// =============================================================================
// Discovery
// =============================================================================

pub const DEFAULT_DISCOVERY_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_DISCOVERY_RETRY_COUNT: u32 = 2;
pub const DEFAULT_DISCOVERY_BACKOFF_MS: u64 = 200;

// =============================================================================
// Queue
// =============================================================================

pub const DEFAULT_QUEUE_MAX_SIZE: usize = 128;
pub const DEFAULT_QUEUE_WORKERS: usize = 2;

// =============================================================================
// Compatibility
// =============================================================================

pub const DEFAULT_EXPECTED_CHECK_BASELINE: usize = 1;
pub const DEFAULT_EXPECTED_COMPLIANCE_BASELINE: usize = 1;

/// Default log file name inside the logs directory.
pub const DEFAULT_LOG_FILE_NAME: &str = "shieldscan.log";

/// Floor applied to every count and timeout.
pub const MIN_POLICY_VALUE: u64 = 1;

/// Clamps `value` to at least [`MIN_POLICY_VALUE`], warning when it was raised.
pub(crate) fn clamp_min<T>(key: &str, value: T) -> T
where
    T: Copy + PartialOrd + From<u8> + std::fmt::Display,
{
    let min = T::from(MIN_POLICY_VALUE as u8);
    if value < min {
        tracing::warn!(
            key,
            requested = %value,
            min = %min,
            "{} below minimum, clamping to {}",
            key,
            min
        );
        min
    } else {
        value
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        let config_dir = super::file::config_directory();

        Self {
            engine: EngineSettings {
                max_workers: DEFAULT_MAX_WORKERS,
                check_timeout_secs: DEFAULT_CHECK_TIMEOUT_SECS,
                service_timeout_secs: DEFAULT_SERVICE_TIMEOUT_SECS,
                global_timeout_secs: DEFAULT_GLOBAL_TIMEOUT_SECS,
                request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                batch_size: DEFAULT_BATCH_SIZE,
            },
            discovery: DiscoverySettings {
                timeout_secs: DEFAULT_DISCOVERY_TIMEOUT_SECS,
                retry_count: DEFAULT_DISCOVERY_RETRY_COUNT,
                backoff_ms: DEFAULT_DISCOVERY_BACKOFF_MS,
            },
            queue: QueueSettings {
                max_size: DEFAULT_QUEUE_MAX_SIZE,
                workers: DEFAULT_QUEUE_WORKERS,
            },
            compatibility: CompatibilitySettings {
                expected_check_baseline: DEFAULT_EXPECTED_CHECK_BASELINE,
                expected_compliance_baseline: DEFAULT_EXPECTED_COMPLIANCE_BASELINE,
            },
            catalog: CatalogSettings { root: None },
            logging: LoggingSettings {
                file: config_dir.join("logs").join(DEFAULT_LOG_FILE_NAME),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_min_raises_zero() {
        assert_eq!(clamp_min("max_workers", 0usize), 1);
        assert_eq!(clamp_min("check_timeout", 0u64), 1);
        assert_eq!(clamp_min("retry_count", 0u32), 1);
    }

    #[test]
    fn test_clamp_min_keeps_valid_values() {
        assert_eq!(clamp_min("batch_size", 250usize), 250);
        assert_eq!(clamp_min("workers", 1usize), 1);
    }

    #[test]
    fn test_default_log_file_under_config_dir() {
        let config = ConfigFile::default();
        assert!(config.logging.file.ends_with("logs/shieldscan.log"));
    }
}
