//! Scan requests and check → service derivation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Providers the bundled catalog tooling knows how to enumerate.
pub const SUPPORTED_PROVIDERS: [&str; 4] = ["aws", "azure", "gcp", "kubernetes"];

/// Derives the owning service of a check from its identifier.
///
/// The service is the identifier text before the first `_`. AWS names its
/// Lambda service package `awslambda`, so `lambda_*` checks map there.
///
/// ```
/// use shieldscan::check::service_from_check;
///
/// assert_eq!(service_from_check("aws", "s3_bucket_public_access"), "s3");
/// assert_eq!(service_from_check("aws", "lambda_function_url_public"), "awslambda");
/// assert_eq!(service_from_check("gcp", "lambda_anything"), "lambda");
/// ```
pub fn service_from_check(provider: &str, check_id: &str) -> String {
    let service = check_id.split('_').next().unwrap_or(check_id);
    if provider == "aws" && service == "lambda" {
        return "awslambda".to_string();
    }
    service.to_string()
}

/// A request to scan one provider.
///
/// Requests are immutable once submitted to the engine. Only `provider`,
/// `checks` and `services` influence orchestration; every other field is
/// handed to the backend untouched when it builds the execution context.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    /// Target provider identifier (e.g. `aws`).
    pub provider: String,
    /// Explicit check ids. When non-empty, discovery is skipped.
    #[serde(default)]
    pub checks: Option<Vec<String>>,
    /// Restricts discovery to these services.
    #[serde(default)]
    pub services: Option<Vec<String>>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub compliance: Option<Vec<String>>,
    #[serde(default)]
    pub severity: Option<Vec<String>>,
    #[serde(default)]
    pub config_file: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    /// Opaque provider-specific parameters.
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl ScanRequest {
    /// Creates a request for every discoverable check of `provider`.
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            ..Self::default()
        }
    }

    /// Restricts the scan to an explicit list of check ids.
    pub fn with_checks<I, S>(mut self, checks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.checks = Some(checks.into_iter().map(Into::into).collect());
        self
    }

    /// Restricts discovery to the given services.
    pub fn with_services<I, S>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.services = Some(services.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Returns the explicit check list, if one was given and is non-empty.
    pub fn explicit_checks(&self) -> Option<&[String]> {
        self.checks.as_deref().filter(|checks| !checks.is_empty())
    }

    /// Returns the service filter, if one was given and is non-empty.
    pub fn service_filter(&self) -> Option<&[String]> {
        self.services.as_deref().filter(|services| !services.is_empty())
    }

    /// Groups the explicit checks by derived service, in first-seen order.
    ///
    /// Returns `None` when the request carries no explicit checks.
    pub fn group_explicit_checks(&self) -> Option<Vec<(String, Vec<String>)>> {
        let checks = self.explicit_checks()?;
        let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
        for check_id in checks {
            let service = service_from_check(&self.provider, check_id);
            match grouped.iter_mut().find(|(name, _)| *name == service) {
                Some((_, ids)) => ids.push(check_id.clone()),
                None => grouped.push((service, vec![check_id.clone()])),
            }
        }
        Some(grouped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_from_check_uses_prefix() {
        assert_eq!(service_from_check("azure", "storage_secure_transfer"), "storage");
        assert_eq!(service_from_check("aws", "ec2"), "ec2");
    }

    #[test]
    fn test_lambda_alias_is_aws_only() {
        assert_eq!(service_from_check("aws", "lambda_x"), "awslambda");
        assert_eq!(service_from_check("azure", "lambda_x"), "lambda");
    }

    #[test]
    fn test_group_explicit_checks_preserves_first_seen_order() {
        let request = ScanRequest::new("aws").with_checks([
            "s3_bucket_versioning",
            "iam_root_mfa",
            "s3_bucket_public",
            "lambda_runtime",
        ]);

        let grouped = request.group_explicit_checks().unwrap();
        assert_eq!(
            grouped,
            vec![
                (
                    "s3".to_string(),
                    vec![
                        "s3_bucket_versioning".to_string(),
                        "s3_bucket_public".to_string()
                    ]
                ),
                ("iam".to_string(), vec!["iam_root_mfa".to_string()]),
                ("awslambda".to_string(), vec!["lambda_runtime".to_string()]),
            ]
        );
    }

    #[test]
    fn test_empty_check_list_is_not_explicit() {
        let request = ScanRequest::new("aws").with_checks(Vec::<String>::new());
        assert!(request.explicit_checks().is_none());
        assert!(request.group_explicit_checks().is_none());
    }

    #[test]
    fn test_request_deserializes_with_missing_fields() {
        let request: ScanRequest =
            serde_json::from_str(r#"{"provider": "gcp", "region": "europe-west1"}"#).unwrap();
        assert_eq!(request.provider, "gcp");
        assert_eq!(request.region.as_deref(), Some("europe-west1"));
        assert!(request.checks.is_none());
        assert!(request.parameters.is_empty());
    }
}
