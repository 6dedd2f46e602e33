//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;
use std::str::FromStr;

use super::defaults::clamp_min;
use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [engine] section
    if let Some(section) = ini.section(Some("engine")) {
        if let Some(v) = section.get("max_workers") {
            config.engine.max_workers =
                clamp_min("max_workers", parse_number("engine", "max_workers", v)?);
        }
        if let Some(v) = section.get("check_timeout") {
            config.engine.check_timeout_secs =
                clamp_min("check_timeout", parse_number("engine", "check_timeout", v)?);
        }
        if let Some(v) = section.get("service_timeout") {
            config.engine.service_timeout_secs = clamp_min(
                "service_timeout",
                parse_number("engine", "service_timeout", v)?,
            );
        }
        if let Some(v) = section.get("global_timeout") {
            config.engine.global_timeout_secs = clamp_min(
                "global_timeout",
                parse_number("engine", "global_timeout", v)?,
            );
        }
        if let Some(v) = section.get("request_timeout") {
            config.engine.request_timeout_secs = clamp_min(
                "request_timeout",
                parse_number("engine", "request_timeout", v)?,
            );
        }
        if let Some(v) = section.get("batch_size") {
            config.engine.batch_size =
                clamp_min("batch_size", parse_number("engine", "batch_size", v)?);
        }
    }

    // [discovery] section
    if let Some(section) = ini.section(Some("discovery")) {
        if let Some(v) = section.get("timeout") {
            config.discovery.timeout_secs =
                clamp_min("discovery.timeout", parse_number("discovery", "timeout", v)?);
        }
        if let Some(v) = section.get("retry_count") {
            config.discovery.retry_count = clamp_min(
                "discovery.retry_count",
                parse_number("discovery", "retry_count", v)?,
            );
        }
        if let Some(v) = section.get("backoff_ms") {
            config.discovery.backoff_ms = parse_number("discovery", "backoff_ms", v)?;
        }
    }

    // [queue] section
    if let Some(section) = ini.section(Some("queue")) {
        if let Some(v) = section.get("max_size") {
            config.queue.max_size =
                clamp_min("queue.max_size", parse_number("queue", "max_size", v)?);
        }
        if let Some(v) = section.get("workers") {
            config.queue.workers =
                clamp_min("queue.workers", parse_number("queue", "workers", v)?);
        }
    }

    // [compatibility] section
    if let Some(section) = ini.section(Some("compatibility")) {
        if let Some(v) = section.get("expected_check_baseline") {
            config.compatibility.expected_check_baseline =
                parse_number("compatibility", "expected_check_baseline", v)?;
        }
        if let Some(v) = section.get("expected_compliance_baseline") {
            config.compatibility.expected_compliance_baseline =
                parse_number("compatibility", "expected_compliance_baseline", v)?;
        }
    }

    // [catalog] section
    if let Some(section) = ini.section(Some("catalog")) {
        if let Some(v) = section.get("root") {
            let v = v.trim();
            if !v.is_empty() {
                config.catalog.root = Some(expand_tilde(v));
            }
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn parse_number<T: FromStr>(section: &str, key: &str, value: &str) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: "must be a non-negative integer".to_string(),
        })
}

/// Expand `~/` prefix to the user's home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::*;

    fn parse(text: &str) -> Result<ConfigFile, ConfigFileError> {
        let ini = Ini::load_from_str(text).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn test_empty_ini_gives_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_engine_section_overrides() {
        let config = parse(
            "[engine]\nmax_workers = 4\ncheck_timeout = 10\nbatch_size = 25\n\
             [discovery]\nretry_count = 5\nbackoff_ms = 0\n",
        )
        .unwrap();

        assert_eq!(config.engine.max_workers, 4);
        assert_eq!(config.engine.check_timeout_secs, 10);
        assert_eq!(config.engine.batch_size, 25);
        assert_eq!(
            config.engine.service_timeout_secs,
            DEFAULT_SERVICE_TIMEOUT_SECS
        );
        assert_eq!(config.discovery.retry_count, 5);
        assert_eq!(config.discovery.backoff_ms, 0);
    }

    #[test]
    fn test_zero_counts_are_clamped() {
        let config = parse("[engine]\nmax_workers = 0\n[queue]\nworkers = 0\n").unwrap();
        assert_eq!(config.engine.max_workers, 1);
        assert_eq!(config.queue.workers, 1);
    }

    #[test]
    fn test_baselines_allow_zero() {
        let config = parse("[compatibility]\nexpected_check_baseline = 0\n").unwrap();
        assert_eq!(config.compatibility.expected_check_baseline, 0);
        assert_eq!(
            config.compatibility.expected_compliance_baseline,
            DEFAULT_EXPECTED_COMPLIANCE_BASELINE
        );
    }

    #[test]
    fn test_invalid_number_is_error() {
        let err = parse("[engine]\nmax_workers = lots\n").unwrap_err();
        match err {
            ConfigFileError::InvalidValue { section, key, .. } => {
                assert_eq!(section, "engine");
                assert_eq!(key, "max_workers");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_catalog_root_and_log_file() {
        let config = parse("[catalog]\nroot = /opt/catalog\n[logging]\nfile = /tmp/s.log\n").unwrap();
        assert_eq!(config.catalog.root, Some(PathBuf::from("/opt/catalog")));
        assert_eq!(config.logging.file, PathBuf::from("/tmp/s.log"));
    }

    #[test]
    fn test_expand_tilde_plain_path() {
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
    }
}
