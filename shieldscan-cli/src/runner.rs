//! CLI runner for common setup and operations.
//!
//! Encapsulates configuration loading, logging initialization, and engine
//! creation to reduce duplication across command handlers.

use crate::error::CliError;
use std::path::PathBuf;
use tracing::info;
use shieldscan::backend::DirectoryBackend;
use shieldscan::config::{ConfigFile, EnginePolicy};
use shieldscan::engine::{CompatibilityBaselines, ScanEngine};
use shieldscan::logging::{init_logging, LoggingGuard, LoggingOptions};

/// Global flags shared by every command.
#[derive(Debug, Clone, Default)]
pub struct RunnerOptions {
    /// Catalog root from `--catalog`, taking precedence over the config.
    pub catalog: Option<PathBuf>,
    /// Mirror logs to stderr.
    pub console: bool,
    /// Debug-level logging when RUST_LOG is unset.
    pub debug: bool,
}

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file, with environment overrides applied
    config: ConfigFile,
    catalog_override: Option<PathBuf>,
}

impl CliRunner {
    /// Load config and initialize logging.
    pub fn new(options: RunnerOptions) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;

        let logging = LoggingOptions::new(&config.logging.file)
            .with_console(options.console)
            .with_debug(options.debug);
        let logging_guard =
            init_logging(&logging).map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
            catalog_override: options.catalog,
        })
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("ShieldScan v{}", shieldscan::VERSION);
        info!("ShieldScan CLI: {} command", command);
    }

    /// Resolve the catalog root: `--catalog` first, then the configuration.
    pub fn catalog_root(&self) -> Result<PathBuf, CliError> {
        let root = resolve_catalog_root(self.catalog_override.as_ref(), &self.config)?;
        info!(catalog = %root.display(), "Using check catalog");
        Ok(root)
    }

    /// Create a filesystem backend over the resolved catalog.
    pub fn create_backend(&self) -> Result<DirectoryBackend, CliError> {
        Ok(DirectoryBackend::new(self.catalog_root()?))
    }

    /// Create a stopped engine from the loaded configuration.
    pub fn create_engine(&self) -> Result<ScanEngine<DirectoryBackend>, CliError> {
        let policy = EnginePolicy::from(&self.config);
        info!(
            max_workers = policy.max_workers,
            batch_size = policy.batch_size,
            check_timeout_secs = policy.check_timeout.as_secs(),
            global_timeout_secs = policy.global_timeout.as_secs(),
            "Creating scan engine"
        );
        let baselines = CompatibilityBaselines::from(&self.config.compatibility);
        Ok(ScanEngine::new(policy, self.create_backend()?).with_baselines(baselines))
    }
}

fn resolve_catalog_root(
    override_root: Option<&PathBuf>,
    config: &ConfigFile,
) -> Result<PathBuf, CliError> {
    let root = override_root
        .or(config.catalog.root.as_ref())
        .cloned()
        .ok_or(CliError::CatalogNotConfigured)?;
    if !root.is_dir() {
        return Err(CliError::CatalogMissing(root));
    }
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_catalog_override_wins() {
        let configured = TempDir::new().unwrap();
        let overridden = TempDir::new().unwrap();
        let mut config = ConfigFile::default();
        config.catalog.root = Some(configured.path().to_path_buf());

        let flag = overridden.path().to_path_buf();
        let root = resolve_catalog_root(Some(&flag), &config).unwrap();
        assert_eq!(root, flag);

        let root = resolve_catalog_root(None, &config).unwrap();
        assert_eq!(root, configured.path());
    }

    #[test]
    fn test_catalog_must_be_configured_and_exist() {
        let config = ConfigFile::default();
        assert!(matches!(
            resolve_catalog_root(None, &config),
            Err(CliError::CatalogNotConfigured)
        ));

        let missing = PathBuf::from("/definitely/not/a/catalog");
        assert!(matches!(
            resolve_catalog_root(Some(&missing), &config),
            Err(CliError::CatalogMissing(_))
        ));
    }
}
