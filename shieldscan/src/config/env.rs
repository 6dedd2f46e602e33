//! Environment variable overlay.
//!
//! Deployment environments configure the engine with plain variables
//! rather than a config file. Each recognized variable overrides the
//! corresponding file value. Counts and timeouts below 1 are clamped to 1;
//! unparsable values are ignored with a warning.
//!
//! | Variable                                | Setting                                   |
//! |-----------------------------------------|-------------------------------------------|
//! | `ENGINE_MAX_WORKERS`                    | `engine.max_workers`                      |
//! | `RULE_TIMEOUT_SECONDS`                  | `engine.check_timeout`                    |
//! | `SERVICE_TIMEOUT_SECONDS`               | `engine.service_timeout`                  |
//! | `GLOBAL_SCAN_TIMEOUT_SECONDS`           | `engine.global_timeout`                   |
//! | `ENGINE_REQUEST_TIMEOUT_SECONDS`        | `engine.request_timeout`                  |
//! | `RULE_BATCH_SIZE`                       | `engine.batch_size`                       |
//! | `COLLECTOR_TIMEOUT_SECONDS`             | `discovery.timeout`                       |
//! | `COLLECTOR_RETRY_COUNT`                 | `discovery.retry_count`                   |
//! | `ENGINE_QUEUE_MAX_SIZE`                 | `queue.max_size`                          |
//! | `ENGINE_QUEUE_WORKERS`                  | `queue.workers`                           |
//! | `EXPECTED_RULE_BASELINE`                | `compatibility.expected_check_baseline`   |
//! | `EXPECTED_COMPLIANCE_MAPPINGS_BASELINE` | `compatibility.expected_compliance_baseline` |
//! | `SHIELDSCAN_CATALOG`                    | `catalog.root`                            |

use std::path::PathBuf;
use std::str::FromStr;

use super::defaults::clamp_min;
use super::settings::ConfigFile;

/// Applies overrides from the process environment.
pub fn apply_env_overrides(config: &mut ConfigFile) {
    apply_overrides_from(config, |name| std::env::var(name).ok());
}

/// Applies overrides using `lookup` to resolve variable names.
pub fn apply_overrides_from<F>(config: &mut ConfigFile, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let engine = &mut config.engine;
    override_min(&lookup, "ENGINE_MAX_WORKERS", &mut engine.max_workers);
    override_min(&lookup, "RULE_TIMEOUT_SECONDS", &mut engine.check_timeout_secs);
    override_min(&lookup, "SERVICE_TIMEOUT_SECONDS", &mut engine.service_timeout_secs);
    override_min(&lookup, "GLOBAL_SCAN_TIMEOUT_SECONDS", &mut engine.global_timeout_secs);
    override_min(&lookup, "ENGINE_REQUEST_TIMEOUT_SECONDS", &mut engine.request_timeout_secs);
    override_min(&lookup, "RULE_BATCH_SIZE", &mut engine.batch_size);

    let discovery = &mut config.discovery;
    override_min(&lookup, "COLLECTOR_TIMEOUT_SECONDS", &mut discovery.timeout_secs);
    override_min(&lookup, "COLLECTOR_RETRY_COUNT", &mut discovery.retry_count);

    override_min(&lookup, "ENGINE_QUEUE_MAX_SIZE", &mut config.queue.max_size);
    override_min(&lookup, "ENGINE_QUEUE_WORKERS", &mut config.queue.workers);

    let compatibility = &mut config.compatibility;
    override_value(&lookup, "EXPECTED_RULE_BASELINE", &mut compatibility.expected_check_baseline);
    override_value(
        &lookup,
        "EXPECTED_COMPLIANCE_MAPPINGS_BASELINE",
        &mut compatibility.expected_compliance_baseline,
    );

    if let Some(root) = lookup("SHIELDSCAN_CATALOG") {
        let root = root.trim();
        if !root.is_empty() {
            config.catalog.root = Some(PathBuf::from(root));
        }
    }
}

fn parse_var<T: FromStr, F: Fn(&str) -> Option<String>>(lookup: &F, name: &str) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = name, value = %raw, "Ignoring unparsable environment override");
            None
        }
    }
}

fn override_value<T, F>(lookup: &F, name: &str, slot: &mut T)
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = parse_var(lookup, name) {
        *slot = value;
    }
}

/// Signed parse so zero and negative values clamp to the minimum.
fn override_min<T, F>(lookup: &F, name: &str, slot: &mut T)
where
    T: TryFrom<i64>,
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = parse_var::<i64, F>(lookup, name) else {
        return;
    };
    match T::try_from(clamp_min(name, value)) {
        Ok(value) => *slot = value,
        Err(_) => {
            tracing::warn!(
                variable = name,
                value,
                "Ignoring out-of-range environment override"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn apply(vars: &[(&str, &str)]) -> ConfigFile {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut config = ConfigFile::default();
        apply_overrides_from(&mut config, |name| vars.get(name).cloned());
        config
    }

    #[test]
    fn test_no_variables_keeps_defaults() {
        assert_eq!(apply(&[]), ConfigFile::default());
    }

    #[test]
    fn test_variables_override_values() {
        let config = apply(&[
            ("ENGINE_MAX_WORKERS", "16"),
            ("RULE_TIMEOUT_SECONDS", " 5 "),
            ("COLLECTOR_RETRY_COUNT", "4"),
            ("ENGINE_QUEUE_WORKERS", "3"),
            ("SHIELDSCAN_CATALOG", "/data/catalog"),
        ]);

        assert_eq!(config.engine.max_workers, 16);
        assert_eq!(config.engine.check_timeout_secs, 5);
        assert_eq!(config.discovery.retry_count, 4);
        assert_eq!(config.queue.workers, 3);
        assert_eq!(config.catalog.root, Some(PathBuf::from("/data/catalog")));
    }

    #[test]
    fn test_invalid_values_are_ignored() {
        let config = apply(&[
            ("ENGINE_MAX_WORKERS", "many"),
            ("COLLECTOR_RETRY_COUNT", "99999999999"),
        ]);
        let defaults = ConfigFile::default();
        assert_eq!(config.engine.max_workers, defaults.engine.max_workers);
        assert_eq!(config.discovery.retry_count, defaults.discovery.retry_count);
    }

    #[test]
    fn test_negative_values_are_clamped() {
        let config = apply(&[
            ("RULE_BATCH_SIZE", "-3"),
            ("ENGINE_MAX_WORKERS", " -1 "),
            ("RULE_TIMEOUT_SECONDS", "-10"),
        ]);
        assert_eq!(config.engine.batch_size, 1);
        assert_eq!(config.engine.max_workers, 1);
        assert_eq!(config.engine.check_timeout_secs, 1);
    }

    #[test]
    fn test_zero_is_clamped_except_baselines() {
        let config = apply(&[
            ("SERVICE_TIMEOUT_SECONDS", "0"),
            ("EXPECTED_RULE_BASELINE", "0"),
            ("EXPECTED_COMPLIANCE_MAPPINGS_BASELINE", "0"),
        ]);
        assert_eq!(config.engine.service_timeout_secs, 1);
        assert_eq!(config.compatibility.expected_check_baseline, 0);
        assert_eq!(config.compatibility.expected_compliance_baseline, 0);
    }
}
