//! Applies the SLO simulator to a request
//!
//! Every simulated route evaluates exactly once, records the outcome on the
//! current span, then waits out the injected delay. The wait is a tokio
//! sleep owned by the request future, so dropping the request drops it.

use canary_core::{CanaryError, Result};
use canary_slo::{AttributeValue, Attributes, OutcomeKind, SimulationOutcome};
use tracing::{info, warn, Span};

use crate::state::{AppState, InFlight};

/// Request span carrying every field the simulation may record.
macro_rules! request_span {
    ($name:literal) => {
        tracing::info_span!(
            $name,
            request.id = %uuid::Uuid::new_v4(),
            service.version = tracing::field::Empty,
            version.label = tracing::field::Empty,
            slo.sim_bad = tracing::field::Empty,
            slo.error_rate = tracing::field::Empty,
            slo.latency_simulation = tracing::field::Empty,
            slo.max_latency = tracing::field::Empty,
            slo.outage_simulation = tracing::field::Empty,
            slo.deployment_type = tracing::field::Empty,
            slo.outcome = tracing::field::Empty,
            slo.injected_delay_seconds = tracing::field::Empty,
            slo.branch = tracing::field::Empty,
            error.simulation_enabled = tracing::field::Empty,
            error.configured_rate = tracing::field::Empty,
            error.draw = tracing::field::Empty,
            error.should_fail = tracing::field::Empty,
            outage.simulation_enabled = tracing::field::Empty,
            outage.draw = tracing::field::Empty,
            outage.should_fail = tracing::field::Empty,
            latency.simulated = tracing::field::Empty,
            latency.draw = tracing::field::Empty,
            latency.duration_seconds = tracing::field::Empty,
            response.latency_ms = tracing::field::Empty,
            response.status = tracing::field::Empty,
            http.status_code = tracing::field::Empty,
            health.status = tracing::field::Empty,
            users.count = tracing::field::Empty,
        )
    };
}

pub(crate) use request_span;

pub fn record_attributes(span: &Span, attrs: &Attributes) {
    for (key, value) in attrs {
        match *value {
            AttributeValue::Bool(v) => span.record(*key, v),
            AttributeValue::Float(v) => span.record(*key, v),
            AttributeValue::Str(v) => span.record(*key, v),
        };
    }
}

/// Run the simulation for the current request.
///
/// Returns the outcome after its delay has elapsed. A randomness failure is
/// returned as [`CanaryError::Simulation`]; a delay longer than the request
/// deadline is cut off at the deadline and returned as [`CanaryError::Timeout`].
pub async fn simulate(state: &AppState) -> Result<SimulationOutcome> {
    let span = Span::current();
    let metrics = &state.metrics;
    let _in_flight = InFlight::enter(&metrics.in_flight);
    metrics.requests.inc();

    span.record("service.version", state.service.service_version.as_str());
    span.record("version.label", state.service.version_label.as_str());
    record_attributes(&span, &state.simulator.config().attributes());

    let outcome = state.simulator.evaluate().map_err(|e| {
        warn!(error = %e, "SLO simulation could not draw randomness");
        CanaryError::from(e)
    })?;
    record_attributes(&span, &outcome.reason_attributes);

    let attributes = serde_json::to_string(&outcome.reason_attributes).unwrap_or_default();
    match outcome.kind {
        OutcomeKind::Normal => info!(
            outcome = %outcome.kind,
            delay_seconds = outcome.injected_delay_seconds,
            attributes = %attributes,
            "SLO simulation evaluated"
        ),
        OutcomeKind::Error => {
            metrics.simulated_errors.inc();
            warn!(
                outcome = %outcome.kind,
                delay_seconds = outcome.injected_delay_seconds,
                attributes = %attributes,
                "SLO simulation injected an error"
            )
        }
        OutcomeKind::Outage => {
            metrics.simulated_outages.inc();
            warn!(
                outcome = %outcome.kind,
                delay_seconds = outcome.injected_delay_seconds,
                attributes = %attributes,
                "SLO simulation injected an outage"
            )
        }
    }

    let delay = outcome.injected_delay();
    if !delay.is_zero() {
        match state.service.request_timeout {
            Some(deadline) if delay > deadline => {
                tokio::time::sleep(deadline).await;
                metrics.injected_delay.record(deadline.as_secs_f64());
                metrics.timeouts.inc();
                span.record("response.latency_ms", deadline.as_secs_f64() * 1000.0);
                warn!(
                    deadline_seconds = deadline.as_secs_f64(),
                    delay_seconds = outcome.injected_delay_seconds,
                    "Injected delay exceeded the request deadline"
                );
                return Err(CanaryError::Timeout(format!(
                    "request exceeded its {:.2}s deadline",
                    deadline.as_secs_f64()
                )));
            }
            _ => tokio::time::sleep(delay).await,
        }
    }

    metrics.injected_delay.record(outcome.injected_delay_seconds);
    span.record("response.latency_ms", outcome.injected_delay_seconds * 1000.0);
    Ok(outcome)
}

/// Record the response on the current span.
pub fn record_response(status: &'static str, code: u16) {
    let span = Span::current();
    span.record("response.status", status);
    span.record("http.status_code", code);
}
