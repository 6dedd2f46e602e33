//! Catalog compatibility validation.
//!
//! Guards against silently scanning with a broken or truncated catalog:
//! counts checks and compliance mappings across all supported providers
//! and compares them to configured baselines, and flags checks whose
//! metadata is missing required keys.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::backend::ScanBackend;
use crate::check::SUPPORTED_PROVIDERS;
use crate::config::CompatibilitySettings;

/// Metadata keys every catalog check must define.
pub const REQUIRED_METADATA_FIELDS: [&str; 4] = ["CheckID", "ServiceName", "Severity", "CheckTitle"];

/// Minimum counts below which the catalog is considered degraded.
///
/// A baseline of zero disables that comparison.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompatibilityBaselines {
    pub expected_checks: usize,
    pub expected_mappings: usize,
}

impl From<&CompatibilitySettings> for CompatibilityBaselines {
    fn from(settings: &CompatibilitySettings) -> Self {
        Self {
            expected_checks: settings.expected_check_baseline,
            expected_mappings: settings.expected_compliance_baseline,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityReport {
    pub catalog_version: String,
    pub check_count: usize,
    pub compliance_mapping_count: usize,
    pub warnings: Vec<String>,
}

impl CompatibilityReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Validates the backend's catalog against `baselines`.
///
/// Blocking: walks the whole catalog of every supported provider.
pub fn validate_compatibility<B: ScanBackend>(
    backend: &B,
    baselines: CompatibilityBaselines,
) -> CompatibilityReport {
    let mut warnings = Vec::new();
    let mut check_count = 0;
    let mut invalid_metadata = 0;
    let mut mapping_count = 0;

    for provider in SUPPORTED_PROVIDERS {
        match backend.catalog(provider) {
            Ok(entries) => {
                check_count += entries.len();
                invalid_metadata += entries
                    .iter()
                    .filter(|entry| {
                        REQUIRED_METADATA_FIELDS
                            .iter()
                            .any(|field| entry.metadata.get(field).is_none())
                    })
                    .count();
            }
            Err(e) => {
                warn!(provider, error = %e, "Failed to enumerate catalog");
            }
        }
        mapping_count += backend.compliance_table(provider).mapping_count();
    }

    if baselines.expected_checks > 0 && check_count < baselines.expected_checks {
        warnings.push(format!(
            "check count {check_count} is below expected baseline {}",
            baselines.expected_checks
        ));
    }
    if invalid_metadata > 0 {
        warnings.push(format!(
            "{invalid_metadata} checks have missing metadata schema fields"
        ));
    }
    if baselines.expected_mappings > 0 && mapping_count < baselines.expected_mappings {
        warnings.push(format!(
            "compliance mapping count {mapping_count} below baseline {}",
            baselines.expected_mappings
        ));
    }

    let report = CompatibilityReport {
        catalog_version: backend.version(),
        check_count,
        compliance_mapping_count: mapping_count,
        warnings,
    };

    if report.is_clean() {
        info!(
            checks = report.check_count,
            mappings = report.compliance_mapping_count,
            "Compatibility validation passed"
        );
    } else {
        warn!(warnings = ?report.warnings, "Compatibility validation warnings");
    }
    report
}
