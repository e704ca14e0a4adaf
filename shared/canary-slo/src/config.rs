//! SLO simulation configuration
//!
//! [`SloOptions`] is the raw operator input. [`SloConfig`] is the validated,
//! immutable policy the simulator consumes. Construction never fails:
//! numeric options outside their domain are clamped, and
//! [`SloOptions::out_of_range`] reports exactly which fields were adjusted.

use canary_core::env::{self, EnvLookup};
use canary_core::Result;
use serde::Serialize;
use std::fmt;
use tracing::warn;

use crate::outcome::Attributes;
use crate::variant::DeploymentVariant;

/// `error_rate` at or above this marks a deployment as chaotic.
const CHAOS_ERROR_RATE: f64 = 0.5;
/// `max_latency` (seconds) at or above this marks a deployment as chaotic.
const CHAOS_MAX_LATENCY: f64 = 5.0;

/// Raw simulation options, as named by the operator-facing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SloOptions {
    pub sim_bad: bool,
    pub error_rate: f64,
    pub latency_simulation: bool,
    pub max_latency: f64,
    pub outage_simulation: bool,
}

impl Default for SloOptions {
    fn default() -> Self {
        Self {
            sim_bad: false,
            error_rate: 0.2,
            latency_simulation: false,
            max_latency: 2.0,
            outage_simulation: false,
        }
    }
}

/// A numeric option that was moved into its domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClampedField {
    pub field: &'static str,
    pub requested: f64,
    pub applied: f64,
}

impl SloOptions {
    /// Read options from the environment. `DEPLOYMENT_VARIANT` picks the base
    /// preset; each individually set variable overrides it.
    pub fn from_lookup(lookup: EnvLookup<'_>) -> Result<Self> {
        let mut options = match lookup("DEPLOYMENT_VARIANT") {
            Some(name) => name.parse::<DeploymentVariant>()?.options(),
            None => Self::default(),
        };

        if let Some(v) = env::bool_var(lookup, "SIM_BAD")? {
            options.sim_bad = v;
        }
        if let Some(v) = env::f64_var(lookup, "ERROR_RATE")? {
            options.error_rate = v;
        }
        if let Some(v) = env::bool_var(lookup, "LATENCY_SIMULATION")? {
            options.latency_simulation = v;
        }
        if let Some(v) = env::f64_var(lookup, "MAX_LATENCY")? {
            options.max_latency = v;
        }
        if let Some(v) = env::bool_var(lookup, "OUTAGE_SIMULATION")? {
            options.outage_simulation = v;
        }

        Ok(options)
    }

    /// Fields that [`SloConfig::new`] will clamp, with the value it will use.
    /// NaN always counts as clamped; `-0.0` does not.
    pub fn out_of_range(&self) -> Vec<ClampedField> {
        let mut clamped = Vec::new();
        let error_rate = clamp_error_rate(self.error_rate);
        if error_rate != self.error_rate {
            clamped.push(ClampedField {
                field: "error_rate",
                requested: self.error_rate,
                applied: error_rate,
            });
        }
        let max_latency = clamp_max_latency(self.max_latency);
        if max_latency != self.max_latency {
            clamped.push(ClampedField {
                field: "max_latency",
                requested: self.max_latency,
                applied: max_latency,
            });
        }
        clamped
    }
}

/// `[0, 1]`; NaN maps to 0.
fn clamp_error_rate(v: f64) -> f64 {
    if v > 0.0 {
        v.min(1.0)
    } else {
        0.0
    }
}

/// `[0, f64::MAX]`; NaN maps to 0 and infinity to the largest finite value.
fn clamp_max_latency(v: f64) -> f64 {
    if v > 0.0 {
        v.min(f64::MAX)
    } else {
        0.0
    }
}

/// Informational label for a configuration. Never consulted by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentType {
    Stable,
    Degraded,
    Chaos,
    Custom,
}

impl DeploymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Degraded => "degraded",
            Self::Chaos => "chaos",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for DeploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated simulation policy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SloConfig {
    #[serde(rename = "sim_bad")]
    simulation_enabled: bool,
    error_rate: f64,
    #[serde(rename = "latency_simulation")]
    latency_simulation_enabled: bool,
    #[serde(rename = "max_latency")]
    max_latency_seconds: f64,
    #[serde(rename = "outage_simulation")]
    outage_simulation_enabled: bool,
}

impl Default for SloConfig {
    fn default() -> Self {
        Self::new(SloOptions::default())
    }
}

impl SloConfig {
    pub fn new(options: SloOptions) -> Self {
        Self {
            simulation_enabled: options.sim_bad,
            error_rate: clamp_error_rate(options.error_rate),
            latency_simulation_enabled: options.latency_simulation,
            max_latency_seconds: clamp_max_latency(options.max_latency),
            outage_simulation_enabled: options.outage_simulation,
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&env::process_env)
    }

    /// Load from the environment, logging every clamped field.
    pub fn from_lookup(lookup: EnvLookup<'_>) -> Result<Self> {
        let options = SloOptions::from_lookup(lookup)?;
        for clamped in options.out_of_range() {
            warn!(
                field = clamped.field,
                requested = clamped.requested,
                applied = clamped.applied,
                "SLO option out of range, clamped"
            );
        }
        Ok(Self::new(options))
    }

    pub fn simulation_enabled(&self) -> bool {
        self.simulation_enabled
    }

    pub fn error_rate(&self) -> f64 {
        self.error_rate
    }

    pub fn latency_simulation_enabled(&self) -> bool {
        self.latency_simulation_enabled
    }

    pub fn max_latency_seconds(&self) -> f64 {
        self.max_latency_seconds
    }

    pub fn outage_simulation_enabled(&self) -> bool {
        self.outage_simulation_enabled
    }

    /// The effective options; feeding them back into [`SloConfig::new`]
    /// yields an identical config.
    pub fn options(&self) -> SloOptions {
        SloOptions {
            sim_bad: self.simulation_enabled,
            error_rate: self.error_rate,
            latency_simulation: self.latency_simulation_enabled,
            max_latency: self.max_latency_seconds,
            outage_simulation: self.outage_simulation_enabled,
        }
    }

    pub fn deployment_type(&self) -> DeploymentType {
        let latency_active = self.latency_simulation_enabled && self.max_latency_seconds > 0.0;

        if !self.simulation_enabled || (self.error_rate == 0.0 && !latency_active) {
            return DeploymentType::Stable;
        }

        let extreme_errors = self.error_rate >= CHAOS_ERROR_RATE;
        let extreme_latency = latency_active && self.max_latency_seconds >= CHAOS_MAX_LATENCY;

        if self.outage_simulation_enabled && (extreme_errors || extreme_latency) {
            DeploymentType::Chaos
        } else if !self.outage_simulation_enabled && !extreme_errors && !extreme_latency {
            DeploymentType::Degraded
        } else {
            DeploymentType::Custom
        }
    }

    /// Config snapshot as flat span attributes.
    pub fn attributes(&self) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert("slo.sim_bad", self.simulation_enabled.into());
        attrs.insert("slo.error_rate", self.error_rate.into());
        attrs.insert("slo.latency_simulation", self.latency_simulation_enabled.into());
        attrs.insert("slo.max_latency", self.max_latency_seconds.into());
        attrs.insert("slo.outage_simulation", self.outage_simulation_enabled.into());
        attrs.insert("slo.deployment_type", self.deployment_type().as_str().into());
        attrs
    }
}
