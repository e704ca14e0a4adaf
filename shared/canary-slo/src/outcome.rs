//! Per-request simulation results

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Flat attribute map attached to the request's span and log record.
pub type Attributes = BTreeMap<&'static str, AttributeValue>;

/// Scalar attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Float(f64),
    Str(&'static str),
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&'static str> for AttributeValue {
    fn from(v: &'static str) -> Self {
        Self::Str(v)
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Str(v) => f.write_str(v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    Normal,
    Error,
    Outage,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Error => "error",
            Self::Outage => "outage",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which decision branch produced the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
    /// Master switch off.
    Disabled,
    Outage,
    ErrorRate,
    /// Simulation ran and no failure fired.
    None,
}

impl Branch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Outage => "outage",
            Self::ErrorRate => "error_rate",
            Self::None => "none",
        }
    }
}

/// Result of one evaluation. Built fresh for every request and never shared.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationOutcome {
    pub kind: OutcomeKind,
    pub branch: Branch,
    pub injected_delay_seconds: f64,
    pub reason_attributes: Attributes,
}

impl SimulationOutcome {
    pub fn is_failure(&self) -> bool {
        self.kind != OutcomeKind::Normal
    }

    /// Delay as a [`Duration`], saturating for ceilings too large to represent.
    pub fn injected_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.injected_delay_seconds).unwrap_or(Duration::MAX)
    }
}
