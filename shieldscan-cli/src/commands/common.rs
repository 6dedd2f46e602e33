//! Shared helpers for command handlers.

use serde::Serialize;

use crate::error::CliError;

/// Render `value` as JSON, pretty-printed on request.
pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, CliError> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(rendered)
}

/// Print `value` as JSON to stdout.
pub fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), CliError> {
    println!("{}", to_json(value, pretty)?);
    Ok(())
}

/// Parse a `KEY=VALUE` argument.
pub fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", raw));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("account=123=456").unwrap(),
            ("account".to_string(), "123=456".to_string())
        );
        assert_eq!(
            parse_key_value(" region =").unwrap(),
            ("region".to_string(), String::new())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_to_json_compact_and_pretty() {
        let value = serde_json::json!({"a": 1});
        assert_eq!(to_json(&value, false).unwrap(), r#"{"a":1}"#);
        assert!(to_json(&value, true).unwrap().contains('\n'));
    }
}
