//! ShieldScan - Concurrent cloud security check execution engine
//!
//! This library runs catalogs of security checks against a cloud provider
//! account, bounding every run with per-check, per-service and global
//! timeouts, and normalizes the findings into flat, compliance-tagged
//! [`check::CheckResult`] records.
//!
//! # High-Level API
//!
//! For most use cases, the [`engine`] module provides a simplified facade:
//!
//! ```ignore
//! use shieldscan::backend::DirectoryBackend;
//! use shieldscan::check::ScanRequest;
//! use shieldscan::config::{ConfigFile, EnginePolicy};
//! use shieldscan::engine::ScanEngine;
//!
//! let config = ConfigFile::load()?;
//! let engine = ScanEngine::new(EnginePolicy::from(&config), DirectoryBackend::new(&config.catalog.root));
//! engine.start();
//!
//! let results = engine
//!     .submit(ScanRequest::new("aws").with_services(vec!["s3".into()]))
//!     .await?;
//! ```
//!
//! Lower-level pieces ([`pipeline::ScanPipeline`], [`queue::JobQueue`],
//! [`discovery::discover_checks`]) can be used directly when the queue or
//! the process-wide metrics are not wanted.

pub mod backend;
pub mod check;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod executor;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod queue;

/// Version of the ShieldScan library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
