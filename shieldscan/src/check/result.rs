//! Normalized check results and synthetic placeholders.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of a result's resource identifier, in characters.
pub const MAX_RESOURCE_ID_LEN: usize = 512;

/// Service name used for engine-level placeholders.
pub const ENGINE_SERVICE: &str = "engine";

pub const SERVICE_TIMEOUT_CHECK_ID: &str = "service_timeout";
pub const SERVICE_TIMEOUT_MESSAGE: &str = "Service execution timeout";
pub const GLOBAL_TIMEOUT_CHECK_ID: &str = "global_timeout";
pub const GLOBAL_TIMEOUT_MESSAGE: &str =
    "Global scan timeout exceeded; partial execution may have completed.";
pub const INIT_ERROR_CHECK_ID: &str = "init_error";
pub const CHECK_TIMEOUT_MESSAGE: &str = "Check execution timeout";
pub const CHECK_ERROR_PREFIX: &str = "Check execution error";

/// Remediation attached to every timeout and error placeholder.
pub const PLACEHOLDER_REMEDIATION: &str =
    "Retry scan with higher timeout or investigate provider latency.";

const INIT_ERROR_RESOURCE: &str = "shieldscan-engine";
const INIT_ERROR_REMEDIATION: &str = "Check credentials and provider configuration.";

// =============================================================================
// Status / Severity
// =============================================================================

/// Outcome of a check against one resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Pass,
    Fail,
    Info,
}

impl CheckStatus {
    /// Normalizes a free-form status string. Anything unrecognized is `Info`.
    pub fn normalize(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_uppercase()).as_deref() {
            Some("PASS") => Self::Pass,
            Some("FAIL") => Self::Fail,
            _ => Self::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Info => "INFO",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a finding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Normalizes a free-form severity string. Missing or unknown is `Medium`.
    pub fn normalize(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("critical") => Self::Critical,
            Some("high") => Self::High,
            Some("low") => Self::Low,
            _ => Self::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// CheckResult
// =============================================================================

/// The canonical, normalized outcome of a check for one resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub provider: String,
    pub service: String,
    pub check_id: String,
    pub status: CheckStatus,
    pub severity: Severity,
    pub resource_id: String,
    pub description: String,
    pub risk: String,
    pub remediation: String,
    pub compliance: Vec<String>,
    pub region: String,
}

impl CheckResult {
    /// Builds the synthetic FAIL/high result used for timeouts and errors.
    ///
    /// The resource id is `provider:service:check_id`, so a placeholder can
    /// always be traced back to the unit that did not complete.
    pub fn placeholder(provider: &str, service: &str, check_id: &str, message: &str) -> Self {
        Self {
            provider: provider.to_string(),
            service: service.to_string(),
            check_id: check_id.to_string(),
            status: CheckStatus::Fail,
            severity: Severity::High,
            resource_id: truncate_resource_id(&format!("{provider}:{service}:{check_id}")),
            description: message.to_string(),
            risk: message.to_string(),
            remediation: PLACEHOLDER_REMEDIATION.to_string(),
            compliance: Vec::new(),
            region: String::new(),
        }
    }

    /// Placeholder for a service whose whole group overran its timeout.
    pub fn service_timeout(provider: &str, service: &str) -> Self {
        Self::placeholder(
            provider,
            service,
            SERVICE_TIMEOUT_CHECK_ID,
            SERVICE_TIMEOUT_MESSAGE,
        )
    }

    /// Placeholder for a run that overran the whole-run timeout.
    pub fn global_timeout(provider: &str) -> Self {
        Self::placeholder(
            provider,
            ENGINE_SERVICE,
            GLOBAL_TIMEOUT_CHECK_ID,
            GLOBAL_TIMEOUT_MESSAGE,
        )
    }

    /// Critical placeholder for a provider whose context could not be built.
    pub fn init_failure(provider: &str, cause: &str) -> Self {
        let description = format!("Provider init failed: {cause}");
        Self {
            provider: provider.to_string(),
            service: ENGINE_SERVICE.to_string(),
            check_id: INIT_ERROR_CHECK_ID.to_string(),
            status: CheckStatus::Fail,
            severity: Severity::Critical,
            resource_id: INIT_ERROR_RESOURCE.to_string(),
            risk: description.clone(),
            description,
            remediation: INIT_ERROR_REMEDIATION.to_string(),
            compliance: Vec::new(),
            region: String::new(),
        }
    }

    pub fn is_fail(&self) -> bool {
        self.status == CheckStatus::Fail
    }
}

/// Bounds a resource identifier to [`MAX_RESOURCE_ID_LEN`] characters.
pub(crate) fn truncate_resource_id(raw: &str) -> String {
    match raw.char_indices().nth(MAX_RESOURCE_ID_LEN) {
        Some((byte_idx, _)) => raw[..byte_idx].to_string(),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_normalization_is_case_insensitive() {
        assert_eq!(CheckStatus::normalize(Some("pass")), CheckStatus::Pass);
        assert_eq!(CheckStatus::normalize(Some(" Fail ")), CheckStatus::Fail);
        assert_eq!(CheckStatus::normalize(Some("info")), CheckStatus::Info);
        assert_eq!(CheckStatus::normalize(Some("MANUAL")), CheckStatus::Info);
        assert_eq!(CheckStatus::normalize(None), CheckStatus::Info);
    }

    #[test]
    fn test_severity_defaults_to_medium() {
        assert_eq!(Severity::normalize(Some("CRITICAL")), Severity::Critical);
        assert_eq!(Severity::normalize(Some("High")), Severity::High);
        assert_eq!(Severity::normalize(Some("low")), Severity::Low);
        assert_eq!(Severity::normalize(Some("informational")), Severity::Medium);
        assert_eq!(Severity::normalize(None), Severity::Medium);
    }

    #[test]
    fn test_placeholder_shape() {
        let result = CheckResult::placeholder("aws", "s3", "s3_c2", CHECK_TIMEOUT_MESSAGE);

        assert_eq!(result.status, CheckStatus::Fail);
        assert_eq!(result.severity, Severity::High);
        assert_eq!(result.resource_id, "aws:s3:s3_c2");
        assert_eq!(result.description, CHECK_TIMEOUT_MESSAGE);
        assert_eq!(result.risk, CHECK_TIMEOUT_MESSAGE);
        assert_eq!(result.remediation, PLACEHOLDER_REMEDIATION);
        assert!(result.compliance.is_empty());
        assert!(result.region.is_empty());
    }

    #[test]
    fn test_global_timeout_uses_engine_service() {
        let result = CheckResult::global_timeout("azure");
        assert_eq!(result.service, ENGINE_SERVICE);
        assert_eq!(result.check_id, GLOBAL_TIMEOUT_CHECK_ID);
        assert_eq!(result.resource_id, "azure:engine:global_timeout");
    }

    #[test]
    fn test_init_failure_is_critical() {
        let result = CheckResult::init_failure("gcp", "missing credentials");
        assert_eq!(result.severity, Severity::Critical);
        assert_eq!(result.check_id, INIT_ERROR_CHECK_ID);
        assert_eq!(
            result.description,
            "Provider init failed: missing credentials"
        );
        assert!(result.is_fail());
    }

    #[test]
    fn test_truncate_resource_id_counts_chars() {
        let long = "é".repeat(600);
        let truncated = truncate_resource_id(&long);
        assert_eq!(truncated.chars().count(), MAX_RESOURCE_ID_LEN);

        assert_eq!(truncate_resource_id("short"), "short");
    }

    #[test]
    fn test_serialized_casing() {
        let result = CheckResult::placeholder("aws", "iam", "iam_x", "m");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "FAIL");
        assert_eq!(json["severity"], "high");
        assert_eq!(json["check_id"], "iam_x");
    }
}
