//! Named deployment presets

use canary_core::CanaryError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::config::SloOptions;

/// Preset selecting a known combination of simulation options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentVariant {
    Stable,
    /// Elevated errors and latency; `bad` is accepted as an alias.
    Degraded,
    Latency,
    Chaos,
}

impl DeploymentVariant {
    pub const ALL: [DeploymentVariant; 4] = [Self::Stable, Self::Degraded, Self::Latency, Self::Chaos];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Degraded => "degraded",
            Self::Latency => "latency",
            Self::Chaos => "chaos",
        }
    }

    pub fn options(&self) -> SloOptions {
        match self {
            Self::Stable => SloOptions::default(),
            Self::Degraded => SloOptions {
                sim_bad: true,
                error_rate: 0.2,
                latency_simulation: true,
                max_latency: 2.0,
                outage_simulation: false,
            },
            Self::Latency => SloOptions {
                sim_bad: true,
                error_rate: 0.0,
                latency_simulation: true,
                max_latency: 3.0,
                outage_simulation: false,
            },
            Self::Chaos => SloOptions {
                sim_bad: true,
                error_rate: 0.5,
                latency_simulation: true,
                max_latency: 5.0,
                outage_simulation: true,
            },
        }
    }
}

impl fmt::Display for DeploymentVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeploymentVariant {
    type Err = CanaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stable" => Ok(Self::Stable),
            "degraded" | "bad" => Ok(Self::Degraded),
            "latency" => Ok(Self::Latency),
            "chaos" => Ok(Self::Chaos),
            other => Err(CanaryError::Config(format!(
                "Unknown DEPLOYMENT_VARIANT {:?} (expected stable, degraded, bad, latency or chaos)",
                other
            ))),
        }
    }
}
