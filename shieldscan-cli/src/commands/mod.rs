//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`scan`] - Run a scan and print results
//! - [`checks`] - List catalog checks
//! - [`compliance`] - List compliance frameworks
//! - [`health`] - Catalog validation and engine health
//! - [`config`] - Configuration management (init, show, path)

pub mod checks;
pub mod common;
pub mod compliance;
pub mod config;
pub mod health;
pub mod scan;
