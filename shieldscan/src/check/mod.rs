//! Check domain types.
//!
//! A *check* is one opaque unit of work executed against a target
//! environment. This module defines the shapes that flow through the engine:
//!
//! - [`ScanRequest`]: what the caller asks for
//! - [`RawFinding`]: what a check produces, before normalization
//! - [`CheckResult`]: the canonical normalized outcome returned to callers
//! - [`ComplianceTable`]: static check → compliance requirement lookup
//!
//! Normalization ([`normalize_finding`]) is deliberately lenient: unknown
//! status values become `INFO`, unknown severities become `medium`, and
//! resource identifiers are bounded in length.

mod compliance;
mod finding;
mod normalize;
mod request;
mod result;

pub use compliance::{list_frameworks, ComplianceEntry, ComplianceTable, FrameworkInfo};
pub use finding::{FindingMetadata, RawFinding};
pub use normalize::{extract_compliance_from_finding, normalize_finding};
pub use request::{service_from_check, ScanRequest, SUPPORTED_PROVIDERS};
pub use result::{
    CheckResult, CheckStatus, Severity, CHECK_ERROR_PREFIX, CHECK_TIMEOUT_MESSAGE, ENGINE_SERVICE,
    GLOBAL_TIMEOUT_CHECK_ID, GLOBAL_TIMEOUT_MESSAGE, INIT_ERROR_CHECK_ID, MAX_RESOURCE_ID_LEN,
    PLACEHOLDER_REMEDIATION, SERVICE_TIMEOUT_CHECK_ID, SERVICE_TIMEOUT_MESSAGE,
};
