//! Filesystem-backed check catalog.
//!
//! # Layout
//!
//! ```text
//! <root>/
//! ├── VERSION                                   (optional catalog label)
//! ├── providers/<provider>/services/<service>/<check_id>/
//! │   ├── <check_id>.metadata.json
//! │   └── run                                   (executable)
//! └── compliance/<provider>/*.json
//! ```
//!
//! Service directories starting with `_` or named `lib` hold shared code
//! and are skipped, as are check directories starting with `_` or lacking
//! a metadata file.
//!
//! # Check protocol
//!
//! A check's `run` program is started in its own directory with the scan
//! context in `SHIELDSCAN_*` environment variables. It must print a JSON
//! array of findings on stdout and exit with status 0. Finding metadata it
//! leaves out is filled from the metadata file.

use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{BackendError, CatalogEntry, Check, CheckError, ScanBackend};
use crate::check::{
    list_frameworks, service_from_check, ComplianceTable, FindingMetadata, FrameworkInfo,
    RawFinding, ScanRequest,
};

/// Name of the executable inside each check directory.
pub const CHECK_PROGRAM: &str = "run";

const METADATA_SUFFIX: &str = ".metadata.json";
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(20);
const STDERR_EXCERPT_LEN: usize = 512;

/// Scan context handed to every [`ScriptCheck`] of one scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryContext {
    pub provider: String,
    pub region: Option<String>,
    pub profile: Option<String>,
    pub role: Option<String>,
    pub config_file: Option<String>,
    pub parameters: BTreeMap<String, String>,
}

impl DirectoryContext {
    /// Environment variables exported to check programs.
    pub fn env_vars(&self) -> Vec<(String, String)> {
        let mut vars = vec![("SHIELDSCAN_PROVIDER".to_string(), self.provider.clone())];
        let optional = [
            ("SHIELDSCAN_REGION", &self.region),
            ("SHIELDSCAN_PROFILE", &self.profile),
            ("SHIELDSCAN_ROLE", &self.role),
            ("SHIELDSCAN_CONFIG_FILE", &self.config_file),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                vars.push((name.to_string(), value.clone()));
            }
        }
        for (key, value) in &self.parameters {
            vars.push((param_var_name(key), value.clone()));
        }
        vars
    }
}

fn param_var_name(key: &str) -> String {
    let normalized: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("SHIELDSCAN_PARAM_{normalized}")
}

// =============================================================================
// DirectoryBackend
// =============================================================================

/// [`ScanBackend`] over a catalog directory.
#[derive(Clone, Debug)]
pub struct DirectoryBackend {
    root: PathBuf,
}

impl DirectoryBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn services_dir(&self, provider: &str) -> PathBuf {
        self.root.join("providers").join(provider).join("services")
    }

    fn compliance_dir(&self, provider: &str) -> PathBuf {
        self.root.join("compliance").join(provider)
    }

    fn check_dir(&self, provider: &str, service: &str, check_id: &str) -> PathBuf {
        self.services_dir(provider).join(service).join(check_id)
    }

    /// Check directories of one service that carry a metadata file.
    fn check_dirs(&self, provider: &str, service: &str) -> Result<Vec<(String, PathBuf)>, BackendError> {
        let service_dir = self.services_dir(provider).join(service);
        if !service_dir.is_dir() {
            return Err(BackendError::ServiceNotFound {
                provider: provider.to_string(),
                service: service.to_string(),
            });
        }

        let checks = sorted_subdirs(&service_dir)?
            .into_iter()
            .filter(|name| !name.starts_with('_'))
            .filter_map(|name| {
                let metadata = metadata_path(&service_dir.join(&name), &name);
                metadata.is_file().then_some((name, metadata))
            })
            .collect();
        Ok(checks)
    }
}

fn metadata_path(check_dir: &Path, check_id: &str) -> PathBuf {
    check_dir.join(format!("{check_id}{METADATA_SUFFIX}"))
}

/// Names of the immediate subdirectories of `dir`, sorted.
fn sorted_subdirs(dir: &Path) -> Result<Vec<String>, BackendError> {
    let read_dir = std::fs::read_dir(dir).map_err(|source| BackendError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut names: Vec<String> = read_dir
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    Ok(names)
}

fn read_metadata(path: &Path) -> Option<Value> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Unreadable check metadata");
            return None;
        }
    };
    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Invalid check metadata");
            None
        }
    }
}

impl ScanBackend for DirectoryBackend {
    type Context = DirectoryContext;

    fn list_services(&self, provider: &str) -> Result<Vec<String>, BackendError> {
        let dir = self.services_dir(provider);
        if !dir.is_dir() {
            return Err(BackendError::ProviderNotFound(provider.to_string()));
        }
        Ok(sorted_subdirs(&dir)?
            .into_iter()
            .filter(|name| !name.starts_with('_') && name != "lib")
            .collect())
    }

    fn discover_service_checks(
        &self,
        provider: &str,
        service: &str,
    ) -> Result<Vec<String>, BackendError> {
        Ok(self
            .check_dirs(provider, service)?
            .into_iter()
            .map(|(name, _)| name)
            .collect())
    }

    fn resolve_check(
        &self,
        provider: &str,
        check_id: &str,
    ) -> Option<Arc<dyn Check<DirectoryContext>>> {
        let service = service_from_check(provider, check_id);
        let dir = self.check_dir(provider, &service, check_id);
        let program = dir.join(CHECK_PROGRAM);
        if !program.is_file() {
            debug!(provider, check_id, path = %program.display(), "Check program not found");
            return None;
        }

        let defaults = read_metadata(&metadata_path(&dir, check_id))
            .and_then(|value| serde_json::from_value::<FindingMetadata>(value).ok())
            .unwrap_or_default();

        Some(Arc::new(ScriptCheck {
            check_id: check_id.to_string(),
            service,
            program,
            defaults,
        }))
    }

    fn build_context(&self, request: &ScanRequest) -> Result<DirectoryContext, BackendError> {
        if !self.services_dir(&request.provider).is_dir() {
            return Err(BackendError::ProviderNotFound(request.provider.clone()));
        }
        Ok(DirectoryContext {
            provider: request.provider.clone(),
            region: request.region.clone(),
            profile: request.profile.clone(),
            role: request.role.clone(),
            config_file: request.config_file.clone(),
            parameters: request.parameters.clone(),
        })
    }

    fn compliance_table(&self, provider: &str) -> ComplianceTable {
        ComplianceTable::load_dir(&self.compliance_dir(provider))
    }

    fn catalog(&self, provider: &str) -> Result<Vec<CatalogEntry>, BackendError> {
        let services = match self.list_services(provider) {
            Ok(services) => services,
            Err(BackendError::ProviderNotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut entries = Vec::new();
        for service in services {
            for (check_id, metadata_file) in self.check_dirs(provider, &service)? {
                let Some(metadata) = read_metadata(&metadata_file) else {
                    continue;
                };
                entries.push(CatalogEntry {
                    provider: provider.to_string(),
                    service: service.clone(),
                    check_id,
                    metadata,
                });
            }
        }
        Ok(entries)
    }

    fn frameworks(&self, provider: &str) -> Vec<FrameworkInfo> {
        list_frameworks(&self.compliance_dir(provider), provider)
    }

    fn version(&self) -> String {
        std::fs::read_to_string(self.root.join("VERSION"))
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

// =============================================================================
// ScriptCheck
// =============================================================================

/// A check implemented by an external program.
#[derive(Debug)]
pub struct ScriptCheck {
    check_id: String,
    service: String,
    program: PathBuf,
    defaults: FindingMetadata,
}

impl ScriptCheck {
    pub fn check_id(&self) -> &str {
        &self.check_id
    }

    fn spawn(&self, ctx: &DirectoryContext) -> Result<Child, CheckError> {
        let mut command = Command::new(&self.program);
        if let Some(dir) = self.program.parent() {
            command.current_dir(dir);
        }
        command
            .envs(ctx.env_vars())
            .env("SHIELDSCAN_SERVICE", &self.service)
            .env("SHIELDSCAN_CHECK_ID", &self.check_id)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        command.spawn().map_err(|source| CheckError::Launch {
            check_id: self.check_id.clone(),
            source,
        })
    }

    fn parse_output(&self, stdout: &[u8]) -> Result<Vec<RawFinding>, CheckError> {
        let mut findings: Vec<RawFinding> =
            serde_json::from_slice(stdout).map_err(|e| CheckError::InvalidOutput {
                check_id: self.check_id.clone(),
                reason: e.to_string(),
            })?;
        for finding in &mut findings {
            finding.metadata.fill_missing(&self.defaults);
        }
        Ok(findings)
    }
}

/// Drains a child pipe on a helper thread so the child never blocks on a
/// full pipe while we poll for its exit.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

impl Check<DirectoryContext> for ScriptCheck {
    fn execute(
        &self,
        ctx: &DirectoryContext,
        cancel: &CancellationToken,
    ) -> Result<Vec<RawFinding>, CheckError> {
        let mut child = self.spawn(ctx)?;
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = loop {
            if cancel.is_cancelled() {
                let _ = child.kill();
                let _ = child.wait();
                debug!(check_id = %self.check_id, "Check program killed after cancellation");
                return Err(CheckError::Cancelled);
            }
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => std::thread::sleep(EXIT_POLL_INTERVAL),
                Err(e) => return Err(CheckError::Failed(e.to_string())),
            }
        };

        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            return Err(CheckError::ExitStatus {
                check_id: self.check_id.clone(),
                code: status.code(),
                stderr: stderr.trim().chars().take(STDERR_EXCERPT_LEN).collect(),
            });
        }

        self.parse_output(&stdout)
    }
}
