//! Environment variable helpers
//!
//! Configuration is resolved through an [`EnvLookup`] so loaders can be
//! exercised against a fixed map instead of the process environment.

use crate::error::{CanaryError, Result};

/// Resolves a variable name to its raw value, if set.
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Lookup backed by the process environment.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Read a string, falling back to `default` when unset.
pub fn string_or(lookup: EnvLookup<'_>, key: &str, default: &str) -> String {
    lookup(key).unwrap_or_else(|| default.to_string())
}

/// Read an optional boolean.
pub fn bool_var(lookup: EnvLookup<'_>, key: &str) -> Result<Option<bool>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => parse_bool(&raw)
            .map(Some)
            .ok_or_else(|| CanaryError::Config(format!("Invalid {}: expected a boolean, got {:?}", key, raw))),
    }
}

/// Read an optional float. NaN is rejected; range checks belong to the caller.
pub fn f64_var(lookup: EnvLookup<'_>, key: &str) -> Result<Option<f64>> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|e| CanaryError::Config(format!("Invalid {}: {}", key, e)))?;
    if value.is_nan() {
        return Err(CanaryError::Config(format!("Invalid {}: NaN is not a number", key)));
    }
    Ok(Some(value))
}

pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" on "), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_bool_var() {
        let lookup = lookup_from(&[("SIM_BAD", "true"), ("BROKEN", "sure")]);
        assert_eq!(bool_var(&lookup, "SIM_BAD").unwrap(), Some(true));
        assert_eq!(bool_var(&lookup, "MISSING").unwrap(), None);
        assert!(matches!(bool_var(&lookup, "BROKEN"), Err(CanaryError::Config(_))));
    }

    #[test]
    fn test_f64_var() {
        let lookup = lookup_from(&[("RATE", " 0.25 "), ("NAN", "NaN"), ("WORD", "lots"), ("BIG", "inf")]);
        assert_eq!(f64_var(&lookup, "RATE").unwrap(), Some(0.25));
        assert_eq!(f64_var(&lookup, "BIG").unwrap(), Some(f64::INFINITY));
        assert_eq!(f64_var(&lookup, "MISSING").unwrap(), None);
        assert!(f64_var(&lookup, "NAN").is_err());
        assert!(f64_var(&lookup, "WORD").is_err());
    }

    #[test]
    fn test_string_or() {
        let lookup = lookup_from(&[("NAME", "web-app")]);
        assert_eq!(string_or(&lookup, "NAME", "x"), "web-app");
        assert_eq!(string_or(&lookup, "OTHER", "x"), "x");
    }
}
