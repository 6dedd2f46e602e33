//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;
use shieldscan::backend::BackendError;
use shieldscan::check::SUPPORTED_PROVIDERS;
use shieldscan::config::ConfigFileError;
use shieldscan::engine::EngineError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// The provider is not one the engine scans
    UnsupportedProvider(String),
    /// No catalog root was configured
    CatalogNotConfigured,
    /// The configured catalog root does not exist
    CatalogMissing(PathBuf),
    /// Failed to read the catalog
    Catalog(BackendError),
    /// The engine rejected or timed out the scan
    Scan(EngineError),
    /// Failed to render output
    Output(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::CatalogNotConfigured | CliError::CatalogMissing(_) => {
                eprintln!();
                eprintln!("Point shieldscan at a check catalog with one of:");
                eprintln!("  1. --catalog <dir>");
                eprintln!("  2. SHIELDSCAN_CATALOG=<dir>");
                eprintln!("  3. [catalog] root = <dir> in the config file (shieldscan config path)");
            }
            CliError::UnsupportedProvider(_) => {
                eprintln!();
                eprintln!("Supported providers: {}", SUPPORTED_PROVIDERS.join(", "));
            }
            CliError::Scan(EngineError::RequestTimeout(_)) => {
                eprintln!();
                eprintln!("Raise [engine] request_timeout or narrow the scan with --service/--check.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::UnsupportedProvider(provider) => {
                write!(f, "Unsupported provider: {}", provider)
            }
            CliError::CatalogNotConfigured => write!(f, "No check catalog configured"),
            CliError::CatalogMissing(path) => {
                write!(f, "Check catalog not found: {}", path.display())
            }
            CliError::Catalog(e) => write!(f, "Failed to read catalog: {}", e),
            CliError::Scan(e) => write!(f, "Scan failed: {}", e),
            CliError::Output(msg) => write!(f, "Failed to render output: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Catalog(e) => Some(e),
            CliError::Scan(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<BackendError> for CliError {
    fn from(e: BackendError) -> Self {
        CliError::Catalog(e)
    }
}

impl From<EngineError> for CliError {
    fn from(e: EngineError) -> Self {
        CliError::Scan(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            CliError::UnsupportedProvider("oci".to_string()).to_string(),
            "Unsupported provider: oci"
        );
        assert_eq!(
            CliError::CatalogMissing(PathBuf::from("/nope")).to_string(),
            "Check catalog not found: /nope"
        );
        assert_eq!(
            CliError::Scan(EngineError::RequestTimeout(Duration::from_secs(2))).to_string(),
            "Scan failed: scan request timed out after 2s"
        );
    }

    #[test]
    fn test_backend_error_is_source() {
        use std::error::Error;
        let err = CliError::from(BackendError::ProviderNotFound("oci".to_string()));
        assert!(err.source().is_some());
    }
}
