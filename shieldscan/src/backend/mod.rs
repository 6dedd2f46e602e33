//! Pluggable scan backends.
//!
//! The engine never knows how a check inspects a target environment. It
//! talks to a [`ScanBackend`] that can enumerate services, list the checks
//! of a service, resolve a check id to a runnable [`Check`], and build the
//! per-scan context the checks run against.
//!
//! ```text
//!   ScanPipeline ──► ScanBackend::build_context(request)   ──► Context
//!                ──► ScanBackend::list_services(provider)
//!                ──► ScanBackend::discover_service_checks   (retried)
//!                ──► ScanBackend::resolve_check(id)         ──► Arc<dyn Check>
//!                                                             └─ execute(ctx, cancel)
//! ```
//!
//! Every method is synchronous and may block; the engine always calls them
//! from a blocking thread.

mod directory;

pub use directory::{DirectoryBackend, DirectoryContext, ScriptCheck};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::check::{
    normalize_finding, CheckResult, ComplianceTable, FrameworkInfo, RawFinding, ScanRequest,
};

/// Errors raised by a backend outside of check execution.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("provider '{0}' not found in catalog")]
    ProviderNotFound(String),

    #[error("service '{service}' not found for provider '{provider}'")]
    ServiceNotFound { provider: String, service: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("context construction failed: {0}")]
    Context(String),
}

/// Errors raised while executing a single check.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("failed to launch check {check_id}: {source}")]
    Launch {
        check_id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("check {check_id} exited with status {code:?}: {stderr}")]
    ExitStatus {
        check_id: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("check {check_id} produced invalid output: {reason}")]
    InvalidOutput { check_id: String, reason: String },

    #[error("check cancelled")]
    Cancelled,

    #[error("{0}")]
    Failed(String),
}

/// One runnable unit of work.
///
/// Implementations should poll `cancel` when they block for long periods;
/// the engine fires it when the check's timeout (or an enclosing one)
/// expires.
pub trait Check<C>: Send + Sync {
    fn execute(&self, ctx: &C, cancel: &CancellationToken) -> Result<Vec<RawFinding>, CheckError>;
}

/// Catalog listing entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub provider: String,
    pub service: String,
    pub check_id: String,
    /// The check's raw metadata document.
    pub metadata: serde_json::Value,
}

/// External capabilities the engine depends on.
pub trait ScanBackend: Send + Sync + 'static {
    /// Per-scan state shared read-only by every check of the scan.
    type Context: Send + Sync + 'static;

    /// Known services of `provider`, in a stable order.
    fn list_services(&self, provider: &str) -> Result<Vec<String>, BackendError>;

    /// Check ids belonging to one service.
    fn discover_service_checks(
        &self,
        provider: &str,
        service: &str,
    ) -> Result<Vec<String>, BackendError>;

    /// Resolves a check id. `None` means the check cannot be loaded.
    fn resolve_check(
        &self,
        provider: &str,
        check_id: &str,
    ) -> Option<Arc<dyn Check<Self::Context>>>;

    /// Builds the execution context for a request. Failure aborts the scan.
    fn build_context(&self, request: &ScanRequest) -> Result<Self::Context, BackendError>;

    /// Static compliance mappings for `provider`.
    fn compliance_table(&self, _provider: &str) -> ComplianceTable {
        ComplianceTable::new()
    }

    fn normalize_finding(
        &self,
        finding: &RawFinding,
        provider: &str,
        compliance: Vec<String>,
    ) -> CheckResult {
        normalize_finding(finding, provider, compliance)
    }

    /// Every check of `provider` with its metadata.
    fn catalog(&self, _provider: &str) -> Result<Vec<CatalogEntry>, BackendError> {
        Ok(Vec::new())
    }

    /// Compliance frameworks available for `provider`.
    fn frameworks(&self, _provider: &str) -> Vec<FrameworkInfo> {
        Vec::new()
    }

    /// Label identifying the check catalog version.
    fn version(&self) -> String {
        "unknown".to_string()
    }
}
