//! Error types for canary services

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CanaryError>;

#[derive(Error, Debug)]
pub enum CanaryError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CanaryError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unavailable(_) => 503,
            Self::Timeout(_) => 504,
            _ => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Network(_) => "NETWORK_ERROR",
            Self::Unavailable(_) => "UNAVAILABLE",
            Self::Timeout(_) => "TIMEOUT",
            Self::Simulation(_) => "SIMULATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<std::io::Error> for CanaryError {
    fn from(err: std::io::Error) -> Self {
        CanaryError::Network(err.to_string())
    }
}
