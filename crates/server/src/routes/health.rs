use crate::state::ServerState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Health check endpoint (liveness)
/// Returns 200 whenever the process can answer at all
pub async fn health_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "userhub-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime": state.uptime().as_secs_f64(),
        "environment": state.config.environment,
    }))
}

/// Readiness check endpoint
/// 200 when every registered check passes, 503 otherwise
pub async fn readiness_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let results = state.readiness();
    let ready = results.iter().all(|(_, ok)| *ok);

    // Checks sharing a name report failed if any of them failed
    let mut checks: BTreeMap<String, bool> = BTreeMap::new();
    for (name, ok) in results {
        *checks.entry(name).or_insert(true) &= ok;
    }

    let (status, label) = if ready {
        (StatusCode::OK, "ready")
    } else {
        tracing::warn!(?checks, "readiness check failed");
        (StatusCode::SERVICE_UNAVAILABLE, "not ready")
    };

    (
        status,
        Json(json!({
            "status": label,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "checks": checks,
        })),
    )
}
