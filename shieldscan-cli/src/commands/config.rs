//! Configuration management CLI commands.
//!
//! Provides `config init`, `config show` and `config path` for creating and
//! inspecting `~/.shieldscan/config.ini`.

use clap::Subcommand;
use std::path::Path;
use shieldscan::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Write a config file with default values
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration (file plus environment overrides)
    Show,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init { force } => run_init(&config_file_path(), force),
        ConfigCommands::Show => run_show(),
        ConfigCommands::Path => run_path(),
    }
}

/// Create the config file.
fn run_init(path: &Path, force: bool) -> Result<(), CliError> {
    if force {
        ConfigFile::default().save_to(path)?;
        println!("Wrote default configuration to {}", path.display());
    } else if ConfigFile::ensure_exists_at(path)? {
        println!("Created configuration file at {}", path.display());
    } else {
        println!("Configuration file already exists: {}", path.display());
        println!("Use --force to overwrite it with defaults.");
    }
    Ok(())
}

/// Print the effective configuration.
fn run_show() -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    print!("{}", config.to_ini_string());
    Ok(())
}

/// Print the config file path.
fn run_path() -> Result<(), CliError> {
    let path = config_file_path();
    println!("{}", path.display());
    if !path.exists() {
        println!("(file does not exist, run 'shieldscan config init' to create it)");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_then_keeps_existing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.ini");

        run_init(&path, false).unwrap();
        assert!(path.exists());

        std::fs::write(&path, "[engine]\nmax_workers = 3\n").unwrap();
        run_init(&path, false).unwrap();
        assert_eq!(ConfigFile::load_from(&path).unwrap().engine.max_workers, 3);

        run_init(&path, true).unwrap();
        assert_eq!(ConfigFile::load_from(&path).unwrap(), ConfigFile::default());
    }
}
