//! Health command.
//!
//! Validates the catalog against the configured baselines and prints the
//! engine health report as JSON.

use clap::Args;

use super::common::print_json;
use crate::error::CliError;
use crate::runner::{CliRunner, RunnerOptions};

/// Arguments for `shieldscan health`.
#[derive(Debug, Args)]
pub struct HealthArgs {
    /// Print compact JSON
    #[arg(long)]
    pub compact: bool,
}

/// Run the health command.
pub async fn run(args: HealthArgs, options: RunnerOptions) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("health");

    let engine = runner.create_engine()?;
    let report = engine.health().await;
    print_json(&report, !args.compact)
}
