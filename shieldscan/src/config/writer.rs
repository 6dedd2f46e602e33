//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let catalog_root = config
        .catalog
        .root
        .as_ref()
        .map(|p| path_to_string(p))
        .unwrap_or_default();

    format!(
        r#"[engine]
; Maximum checks executing at once across a whole scan (minimum 1)
max_workers = {}
; Seconds a single check may run before it is reported as a timeout
check_timeout = {}
; Seconds all checks of one service may take together
service_timeout = {}
; Seconds an entire scan may take
global_timeout = {}
; Seconds an inbound request may wait, including time spent queued.
; Keep this above global_timeout.
request_timeout = {}
; Checks per batch; batches of one service run one after another
batch_size = {}

[discovery]
; Seconds per attempt to list the checks of one service
timeout = {}
; Additional attempts after a failed or timed out listing
retry_count = {}
; Base delay between attempts in milliseconds (multiplied by attempt number)
backoff_ms = {}

[queue]
; Scan requests that may wait for a worker before submitters block
max_size = {}
; Scans processed concurrently
workers = {}

[compatibility]
; Warn when the catalog holds fewer checks than this (0 disables)
expected_check_baseline = {}
; Warn when fewer compliance mappings than this are found (0 disables)
expected_compliance_baseline = {}

[catalog]
; Directory containing providers/ and compliance/ (required for scans)
root = {}

[logging]
; Log file location (truncated on each start)
file = {}
"#,
        config.engine.max_workers,
        config.engine.check_timeout_secs,
        config.engine.service_timeout_secs,
        config.engine.global_timeout_secs,
        config.engine.request_timeout_secs,
        config.engine.batch_size,
        config.discovery.timeout_secs,
        config.discovery.retry_count,
        config.discovery.backoff_ms,
        config.queue.max_size,
        config.queue.workers,
        config.compatibility.expected_check_baseline,
        config.compatibility.expected_compliance_baseline,
        catalog_root,
        path_to_string(&config.logging.file),
    )
}

/// Convert a path to a string, replacing home directory with ~.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_written_config_has_every_section() {
        let text = to_config_string(&ConfigFile::default());
        for section in [
            "[engine]",
            "[discovery]",
            "[queue]",
            "[compatibility]",
            "[catalog]",
            "[logging]",
        ] {
            assert!(text.contains(section), "missing {section}");
        }
        assert!(text.contains("max_workers = 8\n"));
        assert!(text.contains("root = \n"));
    }

    #[test]
    fn test_written_config_parses_back() {
        let config = ConfigFile::default();
        let text = to_config_string(&config);
        let ini = ini::Ini::load_from_str(&text).unwrap();
        let parsed = super::super::parser::parse_ini(&ini).unwrap();
        assert_eq!(parsed, config);
    }
}
