//! Configuration for the scan engine.
//!
//! Configuration is layered:
//!
//! ```text
//!   built-in DEFAULT_* ──► ~/.shieldscan/config.ini ──► environment ──► EnginePolicy
//!        defaults.rs           parser.rs / file.rs          env.rs        policy.rs
//! ```
//!
//! [`ConfigFile`] mirrors the INI sections as plain data. [`EnginePolicy`]
//! is the validated, immutable runtime view handed to the engine.
//!
//! # Example
//!
//! ```
//! use shieldscan::config::{ConfigFile, EnginePolicy};
//!
//! let mut config = ConfigFile::default();
//! config.engine.max_workers = 4;
//!
//! let policy = EnginePolicy::from(&config);
//! assert_eq!(policy.max_workers, 4);
//! ```

mod defaults;
mod env;
mod file;
mod parser;
mod policy;
mod settings;
mod writer;

pub use defaults::*;
pub use env::{apply_env_overrides, apply_overrides_from};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use policy::{DiscoveryPolicy, EnginePolicy};
pub use settings::*;
