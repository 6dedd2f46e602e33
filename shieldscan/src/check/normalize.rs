//! Finding normalization.

use serde_json::Value;

use super::finding::RawFinding;
use super::result::{truncate_resource_id, CheckResult, CheckStatus, Severity};

/// Maps a raw finding to the canonical [`CheckResult`] shape.
///
/// The resource id is the first non-empty of `resource_id`, `resource_arn`
/// and `resource_id_extended`. When the metadata carries no remediation,
/// the extended status text is used instead.
pub fn normalize_finding(finding: &RawFinding, provider: &str, compliance: Vec<String>) -> CheckResult {
    let meta = &finding.metadata;

    let resource_id = [
        &finding.resource_id,
        &finding.resource_arn,
        &finding.resource_id_extended,
    ]
    .into_iter()
    .flatten()
    .find(|s| !s.is_empty())
    .map(|s| truncate_resource_id(s))
    .unwrap_or_default();

    let mut remediation = meta
        .remediation
        .as_ref()
        .and_then(remediation_text)
        .unwrap_or_default();
    if remediation.is_empty() {
        if let Some(extended) = finding.status_extended.as_deref() {
            remediation = extended.to_string();
        }
    }

    CheckResult {
        provider: provider.to_string(),
        service: meta.service_name.clone().unwrap_or_default(),
        check_id: meta.check_id.clone().unwrap_or_default(),
        status: CheckStatus::normalize(finding.status.as_deref()),
        severity: Severity::normalize(meta.severity.as_deref()),
        resource_id,
        description: meta.check_title.clone().unwrap_or_default(),
        risk: meta.risk.clone().unwrap_or_default(),
        remediation,
        compliance,
        region: finding.region.clone().unwrap_or_default(),
    }
}

fn remediation_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("Recommendation")
            .and_then(|rec| rec.get("Text"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

/// Extracts compliance identifiers attached directly to a finding.
///
/// Accepts a map whose values are strings or lists of strings / objects
/// with an `Id` (preferred) or `Framework` key. Anything else is ignored.
pub fn extract_compliance_from_finding(finding: &RawFinding) -> Vec<String> {
    let Some(Value::Object(map)) = finding.compliance.as_ref() else {
        return Vec::new();
    };

    let mut ids = Vec::new();
    for value in map.values() {
        match value {
            Value::String(s) if !s.is_empty() => ids.push(s.clone()),
            Value::Array(items) => {
                for item in items {
                    match item {
                        Value::String(s) if !s.is_empty() => ids.push(s.clone()),
                        Value::Object(obj) => {
                            if let Some(id) = obj.get("Id").or_else(|| obj.get("Framework")) {
                                ids.push(value_to_string(id));
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
    ids
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
