//! ShieldScan CLI - Command-line interface
//!
//! This binary runs security check scans against a filesystem check catalog
//! and inspects the catalog, its compliance frameworks and the engine's
//! health.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::checks::ChecksArgs;
use commands::compliance::ComplianceArgs;
use commands::config::ConfigCommands;
use commands::health::HealthArgs;
use commands::scan::ScanArgs;
use runner::RunnerOptions;

#[derive(Parser)]
#[command(name = "shieldscan")]
#[command(version = shieldscan::VERSION)]
#[command(about = "Run cloud security checks with bounded concurrency and timeouts", long_about = None)]
struct Cli {
    /// Check catalog root (overrides [catalog] root and SHIELDSCAN_CATALOG)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Mirror log output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Enable debug-level logging when RUST_LOG is unset
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scan and print the results as JSON
    Scan(ScanArgs),

    /// List the checks in the catalog
    Checks(ChecksArgs),

    /// List the compliance frameworks available for a provider
    Compliance(ComplianceArgs),

    /// Validate the catalog and print the engine health report
    Health(HealthArgs),

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let options = RunnerOptions {
        catalog: cli.catalog,
        console: cli.verbose,
        debug: cli.debug,
    };

    let result = match cli.command {
        Commands::Scan(args) => commands::scan::run(args, options).await,
        Commands::Checks(args) => commands::checks::run(args, options),
        Commands::Compliance(args) => commands::compliance::run(args, options),
        Commands::Health(args) => commands::health::run(args, options).await,
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
