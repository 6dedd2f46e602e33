//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    /// Check execution limits and timeouts
    pub engine: EngineSettings,
    /// Check discovery behavior
    pub discovery: DiscoverySettings,
    /// Inbound request queue
    pub queue: QueueSettings,
    /// Catalog compatibility baselines
    pub compatibility: CompatibilitySettings,
    /// Check catalog location
    pub catalog: CatalogSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// `[engine]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Maximum concurrently executing checks across a whole run.
    pub max_workers: usize,
    /// Per-check timeout in seconds.
    pub check_timeout_secs: u64,
    /// Per-service timeout in seconds.
    pub service_timeout_secs: u64,
    /// Whole-run timeout in seconds.
    pub global_timeout_secs: u64,
    /// Per-request timeout in seconds, including time spent queued.
    pub request_timeout_secs: u64,
    /// Checks per batch within a service.
    pub batch_size: usize,
}

/// `[discovery]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverySettings {
    /// Timeout per discovery attempt in seconds.
    pub timeout_secs: u64,
    /// Additional attempts after the first failure.
    pub retry_count: u32,
    /// Base backoff between attempts, multiplied by the attempt number.
    pub backoff_ms: u64,
}

/// `[queue]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSettings {
    pub max_size: usize,
    pub workers: usize,
}

/// `[compatibility]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilitySettings {
    /// Minimum expected number of catalog checks (0 disables).
    pub expected_check_baseline: usize,
    /// Minimum expected number of compliance mappings (0 disables).
    pub expected_compliance_baseline: usize,
}

/// `[catalog]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSettings {
    /// Root of the check catalog. `None` until configured.
    pub root: Option<PathBuf>,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub file: PathBuf,
}
