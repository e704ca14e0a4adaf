//! Canary Core - Shared service infrastructure
//!
//! This crate provides:
//! - Standard service trait the demo microservices implement
//! - Error handling utilities
//! - Configuration management backed by environment lookups

pub mod config;
pub mod env;
pub mod error;
pub mod service;

pub use config::ServiceConfig;
pub use env::{process_env, EnvLookup};
pub use error::{CanaryError, Result};
pub use service::{CanaryService, DependencyStatus, HealthStatus, MicroserviceRuntime, ReadinessStatus};
