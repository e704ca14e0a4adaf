//! Configuration management for microservices

use crate::env::{self, EnvLookup};
use crate::error::{CanaryError, Result};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct ServiceConfig {
    pub service_name: String,
    pub http_bind: String,
    pub service_version: String,
    pub version_label: String,
    /// Upper bound on how long a request may spend in injected delays.
    pub request_timeout: Option<Duration>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service_name: "web-app".to_string(),
            http_bind: "0.0.0.0:5000".to_string(),
            service_version: "1.0.0".to_string(),
            version_label: "v1.0.0-unknown".to_string(),
            request_timeout: None,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&env::process_env)
    }

    pub fn from_lookup(lookup: EnvLookup<'_>) -> Result<Self> {
        let defaults = Self::default();

        let request_timeout = match env::f64_var(lookup, "REQUEST_TIMEOUT_SECS")? {
            None => None,
            Some(secs) if secs > 0.0 => Some(Duration::try_from_secs_f64(secs).map_err(|e| {
                CanaryError::Config(format!("Invalid REQUEST_TIMEOUT_SECS: {}", e))
            })?),
            Some(secs) => {
                return Err(CanaryError::Config(format!(
                    "Invalid REQUEST_TIMEOUT_SECS: must be positive, got {}",
                    secs
                )))
            }
        };

        Ok(Self {
            service_name: env::string_or(lookup, "SERVICE_NAME", &defaults.service_name),
            http_bind: env::string_or(lookup, "HTTP_BIND", &defaults.http_bind),
            service_version: env::string_or(lookup, "OTEL_SERVICE_VERSION", &defaults.service_version),
            version_label: env::string_or(lookup, "VERSION_LABEL", &defaults.version_label),
            request_timeout,
        })
    }

    /// `canary` when the version label names a canary build, `stable` otherwise.
    pub fn release_track(&self) -> &'static str {
        if self.version_label.to_ascii_lowercase().contains("canary") {
            "canary"
        } else {
            "stable"
        }
    }
}
