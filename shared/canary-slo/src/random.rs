//! Randomness sources for the simulator

use rand::RngCore;
use std::collections::VecDeque;
use thiserror::Error;

/// 2^-53: maps the top 53 bits of a `u64` onto `[0, 1)`.
const UNIT_SCALE: f64 = 1.0 / 9_007_199_254_740_992.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimulationError {
    #[error("randomness source failed: {0}")]
    RandomnessSource(String),

    #[error("scripted draws exhausted after {0} draws")]
    ScriptExhausted(usize),

    #[error("draw {0} is outside [0, 1)")]
    DrawOutOfRange(f64),
}

impl From<SimulationError> for canary_core::CanaryError {
    fn from(err: SimulationError) -> Self {
        canary_core::CanaryError::Simulation(err.to_string())
    }
}

/// Source of uniform draws in `[0, 1)`.
pub trait RandomSource {
    fn next_unit(&mut self) -> Result<f64, SimulationError>;
}

impl<R: RngCore + ?Sized> RandomSource for R {
    fn next_unit(&mut self) -> Result<f64, SimulationError> {
        let mut buf = [0u8; 8];
        self.try_fill_bytes(&mut buf)
            .map_err(|e| SimulationError::RandomnessSource(e.to_string()))?;
        Ok((u64::from_le_bytes(buf) >> 11) as f64 * UNIT_SCALE)
    }
}

/// Replays a fixed sequence of draws, failing once the sequence runs out.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDraws {
    draws: VecDeque<f64>,
    consumed: usize,
}

impl ScriptedDraws {
    pub fn new(draws: impl IntoIterator<Item = f64>) -> Self {
        Self {
            draws: draws.into_iter().collect(),
            consumed: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.draws.len()
    }

    pub fn consumed(&self) -> usize {
        self.consumed
    }
}

impl RandomSource for ScriptedDraws {
    fn next_unit(&mut self) -> Result<f64, SimulationError> {
        let draw = self
            .draws
            .pop_front()
            .ok_or(SimulationError::ScriptExhausted(self.consumed))?;
        self.consumed += 1;
        Ok(draw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct BrokenRng;

    impl RngCore for BrokenRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
            Err(rand::Error::new(std::io::Error::new(
                std::io::ErrorKind::Other,
                "entropy pool closed",
            )))
        }
    }

    #[test]
    fn test_rng_draws_stay_in_unit_interval() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let draw = rng.next_unit().unwrap();
            assert!((0.0..1.0).contains(&draw));
        }
    }

    #[test]
    fn test_rng_failure_propagates() {
        let err = BrokenRng.next_unit().unwrap_err();
        assert!(matches!(err, SimulationError::RandomnessSource(msg) if msg.contains("entropy pool closed")));
    }

    #[test]
    fn test_scripted_draws_replay_then_exhaust() {
        let mut script = ScriptedDraws::new([0.1, 0.9]);
        assert_eq!(script.next_unit().unwrap(), 0.1);
        assert_eq!(script.next_unit().unwrap(), 0.9);
        assert_eq!(script.remaining(), 0);
        assert_eq!(script.next_unit(), Err(SimulationError::ScriptExhausted(2)));
    }
}
