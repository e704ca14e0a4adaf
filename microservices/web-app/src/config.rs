//! Web App Configuration

use canary_core::env::{self, EnvLookup};
use canary_core::{CanaryError, Result, ServiceConfig};
use canary_slo::SloConfig;

#[derive(Debug, Clone)]
pub struct WebAppConfig {
    pub service: ServiceConfig,
    pub slo: SloConfig,
    /// Seeds a shared generator so a run's failure pattern can be replayed.
    pub random_seed: Option<u64>,
}

impl WebAppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&env::process_env)
    }

    pub fn from_lookup(lookup: EnvLookup<'_>) -> Result<Self> {
        let random_seed = lookup("SLO_RANDOM_SEED")
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .map_err(|e| CanaryError::Config(format!("Invalid SLO_RANDOM_SEED: {}", e)))
            })
            .transpose()?;

        Ok(Self {
            service: ServiceConfig::from_lookup(lookup)?,
            slo: SloConfig::from_lookup(lookup)?,
            random_seed,
        })
    }
}
