//! Raw, pre-normalization findings as produced by checks.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Check metadata carried alongside each finding.
///
/// Key names follow the catalog's `*.metadata.json` schema.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FindingMetadata {
    #[serde(rename = "CheckID")]
    pub check_id: Option<String>,
    #[serde(rename = "ServiceName")]
    pub service_name: Option<String>,
    #[serde(rename = "Severity")]
    pub severity: Option<String>,
    #[serde(rename = "CheckTitle")]
    pub check_title: Option<String>,
    #[serde(rename = "Risk")]
    pub risk: Option<String>,
    /// Either a plain string or `{"Recommendation": {"Text": ...}}`.
    #[serde(rename = "Remediation")]
    pub remediation: Option<Value>,
}

impl FindingMetadata {
    /// Fills every unset field from `defaults`.
    pub fn fill_missing(&mut self, defaults: &FindingMetadata) {
        fn fill<T: Clone>(slot: &mut Option<T>, default: &Option<T>) {
            if slot.is_none() {
                slot.clone_from(default);
            }
        }
        fill(&mut self.check_id, &defaults.check_id);
        fill(&mut self.service_name, &defaults.service_name);
        fill(&mut self.severity, &defaults.severity);
        fill(&mut self.check_title, &defaults.check_title);
        fill(&mut self.risk, &defaults.risk);
        fill(&mut self.remediation, &defaults.remediation);
    }
}

/// A finding as emitted by a check, before normalization.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawFinding {
    pub status: Option<String>,
    pub status_extended: Option<String>,
    pub resource_id: Option<String>,
    pub resource_arn: Option<String>,
    pub resource_id_extended: Option<String>,
    pub region: Option<String>,
    /// Free-form framework → requirement map.
    pub compliance: Option<Value>,
    pub metadata: FindingMetadata,
}

impl RawFinding {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            ..Self::default()
        }
    }

    pub fn with_resource(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn with_check(mut self, check_id: impl Into<String>, service: impl Into<String>) -> Self {
        self.metadata.check_id = Some(check_id.into());
        self.metadata.service_name = Some(service.into());
        self
    }

    pub fn with_severity(mut self, severity: impl Into<String>) -> Self {
        self.metadata.severity = Some(severity.into());
        self
    }
}
