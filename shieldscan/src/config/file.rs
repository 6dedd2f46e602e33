//! Reading and writing `~/.shieldscan/config.ini`.
//!
//! A missing file is not an error: the engine runs on built-in defaults.
//! [`ConfigFile::load`] is the layered entry point (file, then environment);
//! [`ConfigFile::load_from`] reads a single file with no overlay.

use ini::Ini;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::env::apply_env_overrides;
use super::parser::parse_ini;
use super::settings::ConfigFile;
use super::writer::to_config_string;

const CONFIG_DIR_NAME: &str = ".shieldscan";
const CONFIG_FILE_NAME: &str = "config.ini";

/// Errors raised while loading or persisting settings.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid setting {section}.{key} = '{value}': {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigFile {
    /// Defaults, overlaid by the user's config file, overlaid by the
    /// environment.
    pub fn load() -> Result<Self, ConfigFileError> {
        let mut config = Self::load_from(&config_file_path())?;
        apply_env_overrides(&mut config);
        Ok(config)
    }

    /// Reads `path`, falling back to defaults when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path).map_err(|source| ConfigFileError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        parse_ini(&ini)
    }

    /// Writes the commented INI rendering, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        let write_error = |source: io::Error| ConfigFileError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        std::fs::write(path, self.to_ini_string()).map_err(write_error)
    }

    pub fn to_ini_string(&self) -> String {
        to_config_string(self)
    }

    /// Writes defaults to `path` unless a file is already there.
    ///
    /// Returns whether anything was written.
    pub fn ensure_exists_at(path: &Path) -> Result<bool, ConfigFileError> {
        if path.exists() {
            return Ok(false);
        }
        Self::default().save_to(path).map(|()| true)
    }
}

/// `~/.shieldscan`, or `./.shieldscan` when no home directory is known.
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

pub fn config_file_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}
