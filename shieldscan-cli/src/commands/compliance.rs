//! Compliance framework listing command.

use clap::Args;
use shieldscan::backend::ScanBackend;

use super::common::print_json;
use crate::error::CliError;
use crate::runner::{CliRunner, RunnerOptions};

/// Arguments for `shieldscan compliance`.
#[derive(Debug, Args)]
pub struct ComplianceArgs {
    /// Provider whose frameworks to list
    pub provider: String,

    /// Print the frameworks as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the compliance command.
pub fn run(args: ComplianceArgs, options: RunnerOptions) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("compliance");
    let backend = runner.create_backend()?;

    let provider = args.provider.trim().to_lowercase();
    let frameworks = backend.frameworks(&provider);

    if args.json {
        return print_json(&frameworks, true);
    }

    if frameworks.is_empty() {
        println!("No compliance frameworks found for {}", provider);
        return Ok(());
    }

    let table = backend.compliance_table(&provider);
    println!("Compliance frameworks for {}", provider);
    println!();
    for framework in &frameworks {
        let version = if framework.version.is_empty() {
            "-"
        } else {
            framework.version.as_str()
        };
        println!("  {:<32} {:<10} {}", framework.framework, version, framework.description);
    }
    println!();
    println!(
        "{} frameworks, {} checks mapped ({} mappings)",
        frameworks.len(),
        table.check_count(),
        table.mapping_count()
    );
    Ok(())
}
