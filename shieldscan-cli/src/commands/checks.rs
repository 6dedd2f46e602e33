//! Catalog listing command.

use clap::Args;
use shieldscan::backend::{CatalogEntry, ScanBackend};
use shieldscan::check::SUPPORTED_PROVIDERS;

use super::common::print_json;
use crate::error::CliError;
use crate::runner::{CliRunner, RunnerOptions};

/// Arguments for `shieldscan checks`.
#[derive(Debug, Args)]
pub struct ChecksArgs {
    /// Provider to list (all supported providers when omitted)
    pub provider: Option<String>,

    /// Only list checks of this service
    #[arg(long)]
    pub service: Option<String>,

    /// Print the catalog entries as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the checks command.
pub fn run(args: ChecksArgs, options: RunnerOptions) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("checks");
    let backend = runner.create_backend()?;

    let providers: Vec<String> = match &args.provider {
        Some(provider) => vec![provider.trim().to_lowercase()],
        None => SUPPORTED_PROVIDERS.iter().map(|p| p.to_string()).collect(),
    };

    let mut entries = Vec::new();
    for provider in &providers {
        entries.extend(backend.catalog(provider)?);
    }
    if let Some(service) = &args.service {
        entries.retain(|entry| &entry.service == service);
    }

    if args.json {
        return print_json(&entries, true);
    }

    if entries.is_empty() {
        println!("No checks found in {}", backend.root().display());
        return Ok(());
    }
    for entry in &entries {
        println!("{}", format_entry(entry));
    }
    println!();
    println!("{} checks (catalog version {})", entries.len(), backend.version());
    Ok(())
}

/// One line per check: provider, service, severity, id and title.
fn format_entry(entry: &CatalogEntry) -> String {
    let field = |key: &str| {
        entry
            .metadata
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or("-")
            .to_string()
    };
    format!(
        "{:<11} {:<16} {:<9} {:<48} {}",
        entry.provider,
        entry.service,
        field("Severity"),
        entry.check_id,
        field("CheckTitle")
    )
}
