//! Canary SLO - failure injection policy for the demo services
//!
//! Decides, per request, whether to answer normally, fail, or stall as a
//! full outage, and how much latency to inject. The engine is pure: all
//! nondeterminism comes from an injected [`RandomSource`].

pub mod config;
pub mod outcome;
pub mod random;
pub mod simulator;
pub mod variant;

pub use config::{ClampedField, DeploymentType, SloConfig, SloOptions};
pub use outcome::{AttributeValue, Attributes, Branch, OutcomeKind, SimulationOutcome};
pub use random::{RandomSource, ScriptedDraws, SimulationError};
pub use simulator::{evaluate, Entropy, SloSimulator};
pub use variant::DeploymentVariant;
