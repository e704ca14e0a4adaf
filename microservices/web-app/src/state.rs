//! Shared request state

use canary_core::{HealthStatus, ServiceConfig};
use canary_slo::SloSimulator;
use canary_telemetry::{Counter, Gauge, Histogram, PrometheusText};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;

use crate::config::WebAppConfig;

pub const SERVICE_ID: &str = "web-app";

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ServiceConfig>,
    pub simulator: SloSimulator,
    pub metrics: ServiceMetrics,
    started_at: DateTime<Utc>,
    start_time: Instant,
}

impl AppState {
    pub fn new(config: WebAppConfig) -> Self {
        let simulator = match config.random_seed {
            Some(seed) => SloSimulator::new(config.slo).with_seed(seed),
            None => SloSimulator::new(config.slo),
        };
        Self::with_simulator(config.service, simulator)
    }

    pub fn with_simulator(service: ServiceConfig, simulator: SloSimulator) -> Self {
        Self {
            service: Arc::new(service),
            simulator,
            metrics: ServiceMetrics::new(),
            started_at: Utc::now(),
            start_time: Instant::now(),
        }
    }

    pub fn health_status(&self) -> HealthStatus {
        HealthStatus {
            healthy: true,
            service_id: SERVICE_ID.to_string(),
            version: self.service.service_version.clone(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            started_at: self.started_at,
        }
    }
}

#[derive(Clone)]
pub struct ServiceMetrics {
    pub requests: Counter,
    pub simulated_errors: Counter,
    pub simulated_outages: Counter,
    pub timeouts: Counter,
    pub in_flight: Gauge,
    pub injected_delay: Histogram,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            requests: Counter::new("web_app_requests_total"),
            simulated_errors: Counter::new("web_app_simulated_errors_total"),
            simulated_outages: Counter::new("web_app_simulated_outages_total"),
            timeouts: Counter::new("web_app_request_timeouts_total"),
            in_flight: Gauge::new("web_app_requests_in_flight"),
            injected_delay: Histogram::new("web_app_injected_delay_seconds"),
        }
    }

    pub fn render(&self) -> String {
        let mut text = PrometheusText::new();
        text.counter(&self.requests, "Requests subject to SLO simulation")
            .counter(&self.simulated_errors, "Requests failed by the error-rate branch")
            .counter(&self.simulated_outages, "Requests failed by the outage branch")
            .counter(&self.timeouts, "Requests abandoned at the request deadline")
            .gauge(&self.in_flight, "Simulated requests currently in flight")
            .summary(&self.injected_delay, "Injected delay actually waited, in seconds");
        text.finish()
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds the in-flight gauge up until dropped, including on cancellation.
pub struct InFlight(Gauge);

impl InFlight {
    pub fn enter(gauge: &Gauge) -> Self {
        gauge.inc();
        Self(gauge.clone())
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.dec();
    }
}
