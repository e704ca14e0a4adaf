//! Telemetry Configuration

use canary_core::env::{self, EnvLookup};

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub log_level: String,
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "web-app".to_string(),
            log_level: "info".to_string(),
            json_logs: true,
        }
    }
}

impl TelemetryConfig {
    pub fn from_env(default_service_name: &str) -> Self {
        Self::from_lookup(&env::process_env, default_service_name)
    }

    /// Unparseable `JSON_LOGS` keeps the JSON default; logging must come up
    /// before configuration errors can be reported.
    pub fn from_lookup(lookup: EnvLookup<'_>, default_service_name: &str) -> Self {
        Self {
            service_name: env::string_or(lookup, "SERVICE_NAME", default_service_name),
            log_level: env::string_or(lookup, "RUST_LOG", "info"),
            json_logs: lookup("JSON_LOGS")
                .and_then(|v| env::parse_bool(&v))
                .unwrap_or(true),
        }
    }
}
