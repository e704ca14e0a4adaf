//! Web App - SLO Simulation Demo Service
//!
//! Serves a handful of demo routes while injecting configurable failures:
//! - Elevated error rates
//! - Added latency
//! - Full outages that stall for the configured ceiling
//!
//! Every simulated request carries the decision and the active config as
//! span attributes, so dashboards and alert rules can be tested against a
//! known failure pattern.

use canary_core::{CanaryError, CanaryService, MicroserviceRuntime, Result};
use std::sync::Arc;
use tracing::info;

mod config;
mod handlers;
mod simulation;
mod state;


pub use config::WebAppConfig;
use state::{AppState, SERVICE_ID};

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = canary_telemetry::init(SERVICE_ID)
        .map_err(|e| CanaryError::Internal(e.to_string()))?;

    info!("Starting Web App");

    let config = WebAppConfig::from_env()?;
    let service = Arc::new(WebAppService::new(config));
    MicroserviceRuntime::run(service).await
}

pub fn router(state: AppState) -> axum::Router {
    axum::Router::new()
        .route("/", axum::routing::get(handlers::root))
        .route("/health", axum::routing::get(handlers::health))
        .route("/users", axum::routing::get(handlers::users))
        .route("/version", axum::routing::get(handlers::version))
        .route("/slo-config", axum::routing::get(handlers::slo_config))
        .route("/metrics", axum::routing::get(handlers::metrics))
        .route("/livez", axum::routing::get(handlers::livez))
        .route("/ready", axum::routing::get(handlers::ready))
        .with_state(state)
}

pub struct WebAppService {
    state: AppState,
}

impl WebAppService {
    pub fn new(config: WebAppConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }
}

#[async_trait::async_trait]
impl CanaryService for WebAppService {
    fn service_id(&self) -> &'static str {
        SERVICE_ID
    }

    fn version(&self) -> &str {
        &self.state.service.service_version
    }

    async fn shutdown(&self) -> Result<()> {
        info!(
            requests = self.state.metrics.requests.get(),
            in_flight = self.state.metrics.in_flight.get(),
            "Shutting down Web App"
        );
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        let service = &self.state.service;
        let slo = self.state.simulator.config();
        info!(
            bind = %service.http_bind,
            version = %service.service_version,
            label = %service.version_label,
            sim_bad = slo.simulation_enabled(),
            error_rate = slo.error_rate(),
            latency_simulation = slo.latency_simulation_enabled(),
            max_latency = slo.max_latency_seconds(),
            outage_simulation = slo.outage_simulation_enabled(),
            deployment_type = %slo.deployment_type(),
            entropy = ?self.state.simulator.entropy(),
            "Starting Web App HTTP server"
        );

        let listener = tokio::net::TcpListener::bind(&service.http_bind).await?;
        axum::serve(listener, router(self.state.clone())).await?;

        Ok(())
    }
}
