//! Compliance framework mappings.
//!
//! Framework files are JSON documents of the form:
//!
//! ```text
//! {
//!   "Framework": "CIS",            // or "Name"; falls back to the file stem
//!   "Version": "2.0",
//!   "Provider": "aws",
//!   "Description": "...",
//!   "Requirements": [
//!     { "Id": "1.5", "Name": "Root MFA", "Checks": ["iam_root_mfa"] }
//!   ]
//! }
//! ```
//!
//! Every `*.json` file in a provider's compliance directory contributes to
//! one [`ComplianceTable`]. Unreadable or malformed files are skipped.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One requirement of one framework that a check contributes to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComplianceEntry {
    pub framework: String,
    pub requirement_id: String,
    pub requirement_name: String,
}

impl ComplianceEntry {
    /// Renders the entry as a `framework:requirement_id` tag.
    pub fn tag(&self) -> String {
        format!("{}:{}", self.framework, self.requirement_id)
    }
}

/// Summary of one framework file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkInfo {
    pub framework: String,
    pub version: String,
    pub provider: String,
    pub description: String,
}

/// Static check id → compliance entries lookup.
#[derive(Clone, Debug, Default)]
pub struct ComplianceTable {
    entries: HashMap<String, Vec<ComplianceEntry>>,
}

impl ComplianceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry for `check_id`, ignoring exact duplicates.
    pub fn insert(&mut self, check_id: impl Into<String>, entry: ComplianceEntry) {
        let list = self.entries.entry(check_id.into()).or_default();
        if !list.contains(&entry) {
            list.push(entry);
        }
    }

    pub fn entries_for(&self, check_id: &str) -> &[ComplianceEntry] {
        self.entries.get(check_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Tags for `check_id`, in insertion order.
    pub fn tags_for(&self, check_id: &str) -> Vec<String> {
        self.entries_for(check_id)
            .iter()
            .map(ComplianceEntry::tag)
            .collect()
    }

    /// Number of checks with at least one mapping.
    pub fn check_count(&self) -> usize {
        self.entries.len()
    }

    /// Total number of (check, requirement) mappings.
    pub fn mapping_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merges one framework document into the table.
    ///
    /// `fallback_name` is used when the document names no framework.
    pub fn add_framework_document(&mut self, doc: &Value, fallback_name: &str) {
        let framework = framework_name(doc, fallback_name);
        let Some(requirements) = doc.get("Requirements").and_then(Value::as_array) else {
            return;
        };

        for requirement in requirements {
            let requirement_id = string_field(requirement, "Id");
            let requirement_name = string_field(requirement, "Name");
            let Some(checks) = requirement.get("Checks").and_then(Value::as_array) else {
                continue;
            };
            for check_id in checks.iter().filter_map(Value::as_str) {
                if check_id.is_empty() {
                    continue;
                }
                self.insert(
                    check_id,
                    ComplianceEntry {
                        framework: framework.clone(),
                        requirement_id: requirement_id.clone(),
                        requirement_name: requirement_name.clone(),
                    },
                );
            }
        }
    }

    /// Loads every framework file in `dir`.
    ///
    /// A missing directory yields an empty table.
    pub fn load_dir(dir: &Path) -> Self {
        let mut table = Self::new();
        for (path, doc) in read_framework_files(dir) {
            table.add_framework_document(&doc, &file_stem(&path));
        }
        debug!(
            dir = %dir.display(),
            checks = table.check_count(),
            mappings = table.mapping_count(),
            "Loaded compliance table"
        );
        table
    }
}

/// Lists the frameworks found in `dir`, de-duplicated by (name, version).
pub fn list_frameworks(dir: &Path, provider: &str) -> Vec<FrameworkInfo> {
    let mut seen = HashSet::new();
    let mut frameworks = Vec::new();

    for (path, doc) in read_framework_files(dir) {
        let framework = framework_name(&doc, &file_stem(&path));
        let version = string_field(&doc, "Version");
        if !seen.insert((framework.clone(), version.clone())) {
            continue;
        }
        let doc_provider = string_field(&doc, "Provider");
        frameworks.push(FrameworkInfo {
            framework,
            version,
            provider: if doc_provider.is_empty() {
                provider.to_string()
            } else {
                doc_provider
            },
            description: string_field(&doc, "Description"),
        });
    }
    frameworks
}

// =============================================================================
// Helpers
// =============================================================================

/// Reads and parses every `*.json` file in `dir`, sorted by path.
fn read_framework_files(dir: &Path) -> Vec<(PathBuf, Value)> {
    let Ok(read_dir) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut paths: Vec<PathBuf> = read_dir
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    paths
        .into_iter()
        .filter_map(|path| {
            let parsed = std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|text| serde_json::from_str::<Value>(&text).map_err(|e| e.to_string()));
            match parsed {
                Ok(doc) => Some((path, doc)),
                Err(error) => {
                    warn!(path = %path.display(), error = %error, "Skipping compliance file");
                    None
                }
            }
        })
        .collect()
}

fn framework_name(doc: &Value, fallback: &str) -> String {
    ["Framework", "Name"]
        .iter()
        .filter_map(|key| doc.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

fn string_field(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
