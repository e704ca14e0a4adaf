//! HTTP handlers

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use canary_core::{CanaryError, DependencyStatus, ReadinessStatus};
use canary_slo::OutcomeKind;
use serde::Serialize;
use serde_json::json;
use tracing::{Instrument, Span};

use crate::simulation::{record_response, request_span, simulate};
use crate::state::AppState;

/// Error body for failures that are not part of the simulated response set.
pub struct ApiError(pub CanaryError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        record_response("error", status.as_u16());
        let body = Json(json!({
            "error": self.0.to_string(),
            "code": self.0.error_code(),
        }));
        (status, body).into_response()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: u32,
    pub name: &'static str,
    pub email: &'static str,
}

pub const USERS: [User; 3] = [
    User { id: 1, name: "John Doe", email: "john@example.com" },
    User { id: 2, name: "Jane Smith", email: "jane@example.com" },
    User { id: 3, name: "Bob Johnson", email: "bob@example.com" },
];

fn unavailable(state: &AppState) -> Response {
    record_response("error", 503);
    (
        StatusCode::SERVICE_UNAVAILABLE,
        format!("Service Unavailable [{}]", state.service.version_label),
    )
        .into_response()
}

pub async fn root(State(state): State<AppState>) -> Response {
    async move {
        let outcome = match simulate(&state).await {
            Ok(outcome) => outcome,
            Err(e) => return ApiError(e).into_response(),
        };
        if outcome.kind != OutcomeKind::Normal {
            return unavailable(&state);
        }
        record_response("success", 200);
        format!(
            "Application is running! [{}] (Response time: {:.2}s)",
            state.service.version_label, outcome.injected_delay_seconds
        )
        .into_response()
    }
    .instrument(request_span!("root_endpoint"))
    .await
}

/// Simulated health check. Kubernetes sees the injected failures.
pub async fn health(State(state): State<AppState>) -> Response {
    async move {
        let outcome = match simulate(&state).await {
            Ok(outcome) => outcome,
            Err(e) => return ApiError(e).into_response(),
        };
        let label = &state.service.version_label;
        if outcome.is_failure() {
            Span::current().record("health.status", "unhealthy");
            record_response("error", 500);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("ERROR [{}]", label)).into_response()
        } else {
            Span::current().record("health.status", "healthy");
            record_response("success", 200);
            (StatusCode::OK, format!("OK [{}]", label)).into_response()
        }
    }
    .instrument(request_span!("health_check"))
    .await
}

pub async fn users(State(state): State<AppState>) -> Response {
    async move {
        let outcome = match simulate(&state).await {
            Ok(outcome) => outcome,
            Err(e) => return ApiError(e).into_response(),
        };
        if outcome.is_failure() {
            return unavailable(&state);
        }
        Span::current().record("users.count", USERS.len());
        record_response("success", 200);
        Json(json!({
            "users": USERS,
            "response_time": format!("{:.2}s", outcome.injected_delay_seconds),
        }))
        .into_response()
    }
    .instrument(request_span!("users_endpoint"))
    .await
}

pub async fn version(State(state): State<AppState>) -> Json<serde_json::Value> {
    let slo = state.simulator.config();
    Json(json!({
        "version": state.service.service_version,
        "label": state.service.version_label,
        "slo_config": slo,
        "deployment_type": slo.deployment_type(),
        "release_track": state.service.release_track(),
    }))
}

pub async fn slo_config(State(state): State<AppState>) -> Json<serde_json::Value> {
    let slo = state.simulator.config();
    Json(json!({
        "service_info": {
            "version": state.service.service_version,
            "label": state.service.version_label,
            "deployment_type": slo.deployment_type(),
            "release_track": state.service.release_track(),
        },
        "slo_simulation": slo,
        "description": {
            "sim_bad": "Master switch for all bad SLO simulations",
            "error_rate": "Probability of returning errors (0.0-1.0, clamped); also the outage trigger probability",
            "latency_simulation": "Enable artificial latency delays, uniform up to max_latency",
            "max_latency": "Maximum latency in seconds (negative values clamp to 0); outages stall for the full value",
            "outage_simulation": "Enable complete service outages, checked before ordinary errors",
        },
    }))
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
        .into_response()
}

/// Real liveness, never simulated.
pub async fn livez(State(state): State<AppState>) -> Json<canary_core::HealthStatus> {
    Json(state.health_status())
}

pub async fn ready(State(state): State<AppState>) -> Json<ReadinessStatus> {
    Json(ReadinessStatus {
        ready: true,
        dependencies: vec![DependencyStatus {
            name: format!("slo-simulator:{:?}", state.simulator.entropy()),
            available: true,
            latency_ms: None,
        }],
    })
}
