//! Health check endpoint handlers.
//!
//! Both endpoints are operational and run outside the tenant gate.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::state::AppState;

/// Handler for the health check endpoint.
///
/// # HTTP Request
///
/// `GET /health`
///
/// # Response
///
/// - `200 OK` - the process is up
pub async fn health_handler(State(state): State<AppState>) -> Response {
    debug!("Processing health check request");

    let health_response = json!({
        "status": "healthy",
        "tenants": state.registry().len(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    });

    (StatusCode::OK, Json(health_response)).into_response()
}

/// Handler for a readiness probe.
///
/// Pings the database of every tenant, in registry order.
///
/// # HTTP Request
///
/// `GET /_readiness`
///
/// # Response
///
/// - `200 OK` - every tenant database answered
/// - `503 Service Unavailable` - at least one did not
pub async fn readiness_handler(State(state): State<AppState>) -> Response {
    debug!("Processing readiness check request");

    let mut checks = Map::new();
    let mut ready = true;

    for (tenant_id, handle) in state.router().iter() {
        let status = match handle.ping().await {
            Ok(()) => "ok".to_string(),
            Err(err) => {
                warn!(tenant = %tenant_id, error = %err, "Tenant database is not ready");
                ready = false;
                "unavailable".to_string()
            }
        };
        checks.insert(tenant_id.to_string(), Value::String(status));
    }

    let (status, label) = if ready {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    let response = json!({
        "status": label,
        "checks": checks
    });

    (status, Json(response)).into_response()
}
