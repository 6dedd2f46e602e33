//! Scan command.
//!
//! Builds a [`ScanRequest`] from the arguments, runs it through a
//! [`ScanEngine`](shieldscan::engine::ScanEngine) over the filesystem
//! catalog, and prints the results as a JSON array on stdout. A summary
//! goes to stderr so stdout stays machine-readable.

use clap::Args;
use shieldscan::check::{CheckResult, CheckStatus, ScanRequest, SUPPORTED_PROVIDERS};
use shieldscan::metrics::MetricsSnapshot;
use tracing::info;

use super::common::{parse_key_value, print_json};
use crate::error::CliError;
use crate::runner::{CliRunner, RunnerOptions};

/// Arguments for `shieldscan scan`.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Provider to scan (aws, azure, gcp, kubernetes)
    pub provider: String,

    /// Run only these check ids (repeatable); skips discovery
    #[arg(long = "check", value_name = "CHECK_ID")]
    pub checks: Vec<String>,

    /// Restrict discovery to these services (repeatable)
    #[arg(long = "service", value_name = "SERVICE")]
    pub services: Vec<String>,

    /// Target region
    #[arg(long)]
    pub region: Option<String>,

    /// Compliance frameworks of interest (repeatable)
    #[arg(long = "compliance", value_name = "FRAMEWORK")]
    pub compliance: Vec<String>,

    /// Severities of interest (repeatable)
    #[arg(long = "severity", value_name = "SEVERITY")]
    pub severity: Vec<String>,

    /// Provider credentials profile
    #[arg(long)]
    pub profile: Option<String>,

    /// Role to assume
    #[arg(long)]
    pub role: Option<String>,

    /// Provider-specific configuration file
    #[arg(long)]
    pub config_file: Option<String>,

    /// Provider-specific parameter (repeatable)
    #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Print engine metrics in Prometheus text format to stderr
    #[arg(long)]
    pub metrics: bool,
}

impl ScanArgs {
    /// Convert the arguments into an engine request.
    ///
    /// Fails for providers outside [`SUPPORTED_PROVIDERS`].
    pub fn to_request(&self) -> Result<ScanRequest, CliError> {
        let provider = self.provider.trim().to_lowercase();
        if !SUPPORTED_PROVIDERS.contains(&provider.as_str()) {
            return Err(CliError::UnsupportedProvider(provider));
        }

        let mut request = ScanRequest::new(provider);
        if !self.checks.is_empty() {
            request = request.with_checks(self.checks.iter().cloned());
        }
        if !self.services.is_empty() {
            request = request.with_services(self.services.iter().cloned());
        }
        if let Some(region) = &self.region {
            request = request.with_region(region.clone());
        }
        request.compliance = non_empty(&self.compliance);
        request.severity = non_empty(&self.severity);
        request.profile = self.profile.clone();
        request.role = self.role.clone();
        request.config_file = self.config_file.clone();
        for (key, value) in &self.params {
            request = request.with_parameter(key.clone(), value.clone());
        }
        Ok(request)
    }
}

fn non_empty(values: &[String]) -> Option<Vec<String>> {
    (!values.is_empty()).then(|| values.to_vec())
}

/// Per-status counts printed after a scan.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub info: usize,
}

impl ScanSummary {
    pub fn from_results(results: &[CheckResult]) -> Self {
        results.iter().fold(Self::default(), |mut summary, result| {
            summary.total += 1;
            match result.status {
                CheckStatus::Pass => summary.passed += 1,
                CheckStatus::Fail => summary.failed += 1,
                CheckStatus::Info => summary.info += 1,
            }
            summary
        })
    }
}

/// Run the scan command.
pub async fn run(args: ScanArgs, options: RunnerOptions) -> Result<(), CliError> {
    let request = args.to_request()?;
    let runner = CliRunner::new(options)?;
    runner.log_startup("scan");

    let engine = runner.create_engine()?;
    info!(provider = %request.provider, "Submitting scan");

    engine.start();
    let outcome = engine.submit(request).await;
    engine.stop().await;
    let results = outcome?;

    print_json(&results, args.pretty)?;

    let summary = ScanSummary::from_results(&results);
    eprintln!(
        "{} results: {} passed, {} failed, {} info",
        summary.total, summary.passed, summary.failed, summary.info
    );
    if args.metrics {
        print_metrics(&engine.metrics_snapshot());
    }
    Ok(())
}

fn print_metrics(snapshot: &MetricsSnapshot) {
    eprint!("{}", snapshot.to_prometheus());
}
