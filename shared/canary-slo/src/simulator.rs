//! SLO decision engine
//!
//! Evaluation order is fixed: master switch, then outage, then error rate,
//! then latency. Outage and error each consume their own draw and share the
//! single `error_rate` dial, so an enabled outage branch takes probability
//! mass from the error branch rather than adding to it.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;
use std::sync::Arc;

use crate::config::SloConfig;
use crate::outcome::{Attributes, Branch, OutcomeKind, SimulationOutcome};
use crate::random::{RandomSource, ScriptedDraws, SimulationError};

/// Evaluate `config` once against draws from `rng`.
pub fn evaluate<R: RandomSource + ?Sized>(
    config: &SloConfig,
    rng: &mut R,
) -> Result<SimulationOutcome, SimulationError> {
    let mut attrs = Attributes::new();

    if !config.simulation_enabled() {
        attrs.insert("error.simulation_enabled", false.into());
        attrs.insert("outage.simulation_enabled", false.into());
        attrs.insert("latency.simulated", false.into());
        return Ok(finish(OutcomeKind::Normal, Branch::Disabled, 0.0, attrs));
    }

    let error_rate = config.error_rate();
    attrs.insert("error.configured_rate", error_rate.into());
    attrs.insert("outage.simulation_enabled", config.outage_simulation_enabled().into());

    if config.outage_simulation_enabled() {
        let r1 = draw(rng)?;
        let fired = r1 < error_rate;
        attrs.insert("outage.draw", r1.into());
        attrs.insert("outage.should_fail", fired.into());
        if fired {
            // With latency simulation on, outages stall for the full ceiling
            // like a hung dependency; otherwise they fail fast.
            let stall = if config.latency_simulation_enabled() {
                config.max_latency_seconds()
            } else {
                0.0
            };
            attrs.insert("latency.simulated", config.latency_simulation_enabled().into());
            attrs.insert("latency.duration_seconds", stall.into());
            return Ok(finish(OutcomeKind::Outage, Branch::Outage, stall, attrs));
        }
    }

    let r2 = draw(rng)?;
    let error_fired = r2 < error_rate;
    attrs.insert("error.simulation_enabled", true.into());
    attrs.insert("error.draw", r2.into());
    attrs.insert("error.should_fail", error_fired.into());

    let delay = if config.latency_simulation_enabled() {
        let r3 = draw(rng)?;
        let delay = r3 * config.max_latency_seconds();
        attrs.insert("latency.draw", r3.into());
        attrs.insert("latency.simulated", true.into());
        attrs.insert("latency.duration_seconds", delay.into());
        delay
    } else {
        attrs.insert("latency.simulated", false.into());
        0.0
    };

    let (kind, branch) = if error_fired {
        (OutcomeKind::Error, Branch::ErrorRate)
    } else {
        (OutcomeKind::Normal, Branch::None)
    };
    Ok(finish(kind, branch, delay, attrs))
}

fn draw<R: RandomSource + ?Sized>(rng: &mut R) -> Result<f64, SimulationError> {
    let value = rng.next_unit()?;
    if (0.0..1.0).contains(&value) {
        Ok(value)
    } else {
        Err(SimulationError::DrawOutOfRange(value))
    }
}

fn finish(kind: OutcomeKind, branch: Branch, delay: f64, mut attrs: Attributes) -> SimulationOutcome {
    attrs.insert("slo.outcome", kind.as_str().into());
    attrs.insert("slo.branch", branch.as_str().into());
    attrs.insert("slo.injected_delay_seconds", delay.into());
    SimulationOutcome {
        kind,
        branch,
        injected_delay_seconds: delay,
        reason_attributes: attrs,
    }
}

/// Where a [`SloSimulator`] takes its draws from.
#[derive(Clone, Default)]
pub enum Entropy {
    /// Per-thread generator; concurrent requests never contend.
    #[default]
    ThreadLocal,
    /// One seeded generator shared behind a lock, for reproducible runs.
    Seeded(Arc<Mutex<StdRng>>),
    /// Fixed draw sequence shared behind a lock.
    Scripted(Arc<Mutex<ScriptedDraws>>),
}

impl fmt::Debug for Entropy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ThreadLocal => write!(f, "ThreadLocal"),
            Self::Seeded(_) => write!(f, "Seeded"),
            Self::Scripted(_) => write!(f, "Scripted"),
        }
    }
}

/// Cheaply cloneable handle pairing a config with its randomness source.
#[derive(Debug, Clone)]
pub struct SloSimulator {
    config: Arc<SloConfig>,
    entropy: Entropy,
}

impl SloSimulator {
    pub fn new(config: SloConfig) -> Self {
        Self {
            config: Arc::new(config),
            entropy: Entropy::ThreadLocal,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.entropy = Entropy::Seeded(Arc::new(Mutex::new(StdRng::seed_from_u64(seed))));
        self
    }

    pub fn with_script(mut self, draws: ScriptedDraws) -> Self {
        self.entropy = Entropy::Scripted(Arc::new(Mutex::new(draws)));
        self
    }

    pub fn config(&self) -> &SloConfig {
        &self.config
    }

    pub fn entropy(&self) -> &Entropy {
        &self.entropy
    }

    pub fn evaluate(&self) -> Result<SimulationOutcome, SimulationError> {
        match &self.entropy {
            Entropy::ThreadLocal => evaluate(&self.config, &mut rand::thread_rng()),
            Entropy::Seeded(rng) => evaluate(&self.config, &mut *rng.lock()),
            Entropy::Scripted(script) => evaluate(&self.config, &mut *script.lock()),
        }
    }

    pub fn evaluate_with<R: RandomSource + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<SimulationOutcome, SimulationError> {
        evaluate(&self.config, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SloOptions;
    use crate::outcome::AttributeValue;

    const TRIALS: usize = 10_000;

    fn config(
        sim_bad: bool,
        error_rate: f64,
        latency_simulation: bool,
        max_latency: f64,
        outage_simulation: bool,
    ) -> SloConfig {
        SloConfig::new(SloOptions {
            sim_bad,
            error_rate,
            latency_simulation,
            max_latency,
            outage_simulation,
        })
    }

    fn seeded(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    #[test]
    fn test_disabled_is_always_normal_without_drawing() {
        let config = config(false, 1.0, true, 5.0, true);
        let mut script = ScriptedDraws::new([0.0, 0.0, 0.99]);

        let outcome = evaluate(&config, &mut script).unwrap();
        assert_eq!(outcome.kind, OutcomeKind::Normal);
        assert_eq!(outcome.branch, Branch::Disabled);
        assert_eq!(outcome.injected_delay_seconds, 0.0);
        assert_eq!(script.consumed(), 0);

        // An empty script would fail on the first draw, so none is taken.
        let outcome = evaluate(&config, &mut ScriptedDraws::default()).unwrap();
        assert_eq!(outcome.kind, OutcomeKind::Normal);
    }

    #[test]
    fn test_zero_error_rate_never_fails() {
        let config = config(true, 0.0, true, 2.0, true);
        let mut rng = seeded(1);
        for _ in 0..TRIALS {
            let outcome = evaluate(&config, &mut rng).unwrap();
            assert_eq!(outcome.kind, OutcomeKind::Normal);
        }
    }

    #[test]
    fn test_full_error_rate_with_outage_is_always_outage() {
        let config = config(true, 1.0, true, 2.5, true);
        let mut rng = seeded(2);
        for _ in 0..TRIALS {
            let outcome = evaluate(&config, &mut rng).unwrap();
            assert_eq!(outcome.kind, OutcomeKind::Outage);
            assert_eq!(outcome.injected_delay_seconds, 2.5);
        }
    }

    #[test]
    fn test_full_error_rate_without_outage_is_always_error() {
        let config = config(true, 1.0, false, 2.0, false);
        let mut rng = seeded(3);
        for _ in 0..TRIALS {
            assert_eq!(evaluate(&config, &mut rng).unwrap().kind, OutcomeKind::Error);
        }
    }

    #[test]
    fn test_error_frequency_matches_rate() {
        let config = config(true, 0.3, false, 2.0, false);
        let mut rng = seeded(4);
        let trials = 100_000;
        let errors = (0..trials)
            .filter(|_| evaluate(&config, &mut rng).unwrap().kind == OutcomeKind::Error)
            .count();
        let observed = errors as f64 / trials as f64;
        assert!((observed - 0.3).abs() < 0.01, "observed error rate {}", observed);
    }

    #[test]
    fn test_outage_takes_mass_from_errors() {
        // P(outage) = 0.3, P(error) = 0.7 * 0.3 = 0.21
        let config = config(true, 0.3, false, 1.0, true);
        let mut rng = seeded(5);
        let trials = 100_000;
        let (mut outages, mut errors) = (0, 0);
        for _ in 0..trials {
            match evaluate(&config, &mut rng).unwrap().kind {
                OutcomeKind::Outage => outages += 1,
                OutcomeKind::Error => errors += 1,
                OutcomeKind::Normal => {}
            }
        }
        assert!((outages as f64 / trials as f64 - 0.3).abs() < 0.01);
        assert!((errors as f64 / trials as f64 - 0.21).abs() < 0.01);
    }

    #[test]
    fn test_latency_stays_within_ceiling() {
        let config = config(true, 0.5, true, 1.75, false);
        let mut rng = seeded(6);
        for _ in 0..TRIALS {
            let delay = evaluate(&config, &mut rng).unwrap().injected_delay_seconds;
            assert!((0.0..=1.75).contains(&delay), "delay {} out of range", delay);
        }
    }

    #[test]
    fn test_latency_disabled_means_zero_delay() {
        let config = config(true, 0.5, false, 100.0, false);
        let mut rng = seeded(7);
        for _ in 0..TRIALS {
            assert_eq!(evaluate(&config, &mut rng).unwrap().injected_delay_seconds, 0.0);
        }
    }

    #[test]
    fn test_outage_without_latency_fails_fast() {
        let config = config(true, 1.0, false, 2.0, true);
        let mut rng = seeded(9);
        for _ in 0..TRIALS {
            let outcome = evaluate(&config, &mut rng).unwrap();
            assert_eq!(outcome.kind, OutcomeKind::Outage);
            assert_eq!(outcome.injected_delay_seconds, 0.0);
            assert_eq!(outcome.reason_attributes["latency.simulated"], AttributeValue::Bool(false));
        }
    }

    #[test]
    fn test_latency_disabled_means_zero_delay_for_every_branch() {
        let config = config(true, 0.5, false, 100.0, true);
        let mut rng = seeded(10);
        for _ in 0..TRIALS {
            assert_eq!(evaluate(&config, &mut rng).unwrap().injected_delay_seconds, 0.0);
        }
    }

    #[test]
    fn test_zero_ceiling_makes_latency_a_no_op() {
        let config = config(true, 0.0, true, 0.0, false);
        let outcome = evaluate(&config, &mut ScriptedDraws::new([0.5, 0.99])).unwrap();
        assert_eq!(outcome.injected_delay_seconds, 0.0);
    }

    #[test]
    fn test_outage_fires_and_stalls_for_full_ceiling() {
        let config = config(true, 0.3, true, 3.0, true);
        let mut script = ScriptedDraws::new([0.1]);

        let outcome = evaluate(&config, &mut script).unwrap();
        assert_eq!(outcome.kind, OutcomeKind::Outage);
        assert_eq!(outcome.branch, Branch::Outage);
        assert_eq!(outcome.injected_delay_seconds, 3.0);
        assert_eq!(script.consumed(), 1);
        assert_eq!(outcome.reason_attributes["outage.draw"], AttributeValue::Float(0.1));
        assert_eq!(outcome.reason_attributes["slo.branch"], AttributeValue::Str("outage"));
    }

    #[test]
    fn test_error_with_independent_latency_draw() {
        let config = config(true, 0.3, true, 3.0, true);
        let outcome = evaluate(&config, &mut ScriptedDraws::new([0.9, 0.05, 0.5])).unwrap();

        assert_eq!(outcome.kind, OutcomeKind::Error);
        assert_eq!(outcome.branch, Branch::ErrorRate);
        assert!((outcome.injected_delay_seconds - 1.5).abs() < 1e-12);

        let attrs = &outcome.reason_attributes;
        assert_eq!(attrs["outage.should_fail"], AttributeValue::Bool(false));
        assert_eq!(attrs["error.draw"], AttributeValue::Float(0.05));
        assert_eq!(attrs["error.should_fail"], AttributeValue::Bool(true));
        assert_eq!(attrs["latency.draw"], AttributeValue::Float(0.5));
        assert_eq!(attrs["slo.outcome"], AttributeValue::Str("error"));
    }

    #[test]
    fn test_normal_without_latency() {
        let config = config(true, 0.3, false, 2.0, false);
        let mut script = ScriptedDraws::new([0.5]);

        let outcome = evaluate(&config, &mut script).unwrap();
        assert_eq!(outcome.kind, OutcomeKind::Normal);
        assert_eq!(outcome.branch, Branch::None);
        assert_eq!(outcome.injected_delay_seconds, 0.0);
        assert_eq!(script.remaining(), 0);
        assert_eq!(outcome.reason_attributes["latency.simulated"], AttributeValue::Bool(false));
    }

    #[test]
    fn test_draw_failures_propagate() {
        let config = config(true, 0.3, true, 2.0, true);

        let err = evaluate(&config, &mut ScriptedDraws::new([0.9])).unwrap_err();
        assert_eq!(err, SimulationError::ScriptExhausted(1));

        let err = evaluate(&config, &mut ScriptedDraws::new([1.0])).unwrap_err();
        assert_eq!(err, SimulationError::DrawOutOfRange(1.0));

        let err = evaluate(&config, &mut ScriptedDraws::new([f64::NAN])).unwrap_err();
        assert!(matches!(err, SimulationError::DrawOutOfRange(v) if v.is_nan()));
    }

    #[test]
    fn test_seeded_simulator_is_reproducible() {
        let config = config(true, 0.4, true, 2.0, true);
        let a = SloSimulator::new(config.clone()).with_seed(42);
        let b = SloSimulator::new(config).with_seed(42);
        for _ in 0..100 {
            assert_eq!(a.evaluate().unwrap(), b.evaluate().unwrap());
        }
    }

    #[test]
    fn test_scripted_simulator_shares_draws_across_clones() {
        let simulator = SloSimulator::new(config(true, 0.3, false, 2.0, false))
            .with_script(ScriptedDraws::new([0.1, 0.9]));
        let clone = simulator.clone();

        assert_eq!(simulator.evaluate().unwrap().kind, OutcomeKind::Error);
        assert_eq!(clone.evaluate().unwrap().kind, OutcomeKind::Normal);
        assert!(simulator.evaluate().is_err());
    }

    #[test]
    fn test_thread_local_evaluations_run_concurrently() {
        let simulator = SloSimulator::new(config(true, 0.5, true, 1.0, true));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let simulator = simulator.clone();
                std::thread::spawn(move || {
                    (0..1_000)
                        .map(|_| simulator.evaluate().unwrap().injected_delay_seconds)
                        .all(|d| (0.0..=1.0).contains(&d))
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
