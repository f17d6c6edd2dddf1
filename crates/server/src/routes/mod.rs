//! API route handlers
//!
//! Routes are organized by functionality:
//!
//! - `health`: liveness and readiness probes (public)
//! - `users`: the user resource (behind the API key)
//!
//! The root welcome, API metadata, status snapshot, OpenAPI document and the
//! fallback live here.

pub mod health;
pub mod users;

use crate::error::{ServerError, ServerResult};
use crate::middleware::API_KEY_HEADER;
use crate::openapi;
use crate::state::ServerState;
use axum::extract::State;
use axum::http::Uri;
use axum::response::IntoResponse;
use axum::Json;
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

/// Success envelope: `{success: true, count?, message?, data}`.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            count: None,
            message: None,
            data,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// List payload with its `count`.
    pub fn list(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: Some(data.len()),
            message: None,
            data,
        }
    }
}

/// Welcome message (GET /), public.
pub async fn welcome() -> impl IntoResponse {
    Json(json!({
        "message": "Welcome to the userhub API",
        "version": env!("CARGO_PKG_VERSION"),
        "documentation": "/api-docs.json",
    }))
}

/// API metadata (GET /api/v1/info).
pub async fn api_info() -> impl IntoResponse {
    Json(json!({
        "name": "userhub API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "In-memory user directory with health probes and API key authentication",
        "endpoints": [
            "GET /health - Public health check",
            "GET /ready - Public readiness check",
            "GET /api-docs.json - Public OpenAPI document",
            "GET /api/v1/info - API information (requires API key)",
            "GET /api/v1/status - System status (requires API key)",
            "GET /api/v1/users - Get all users (requires API key)",
            "GET /api/v1/users/:id - Get user by ID (requires API key)",
            "GET /api/v1/users/search?name=xxx - Search users (requires API key)",
            "POST /api/v1/users - Create user (requires API key)",
            "PUT /api/v1/users/:id - Update user (requires API key)",
            "DELETE /api/v1/users/:id - Delete user (requires API key)",
        ],
        "authentication": {
            "type": "API Key",
            "header": "X-API-Key",
            "required": true,
        },
    }))
}

/// Process snapshot returned by `/api/v1/status`.
#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub platform: &'static str,
    pub arch: &'static str,
    pub pid: u32,
    /// Seconds since the server state was created
    pub uptime: f64,
    pub users: usize,
}

/// System status (GET /api/v1/status).
pub async fn system_status(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let system = SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        platform: std::env::consts::OS,
        arch: std::env::consts::ARCH,
        pid: std::process::id(),
        uptime: state.uptime().as_secs_f64(),
        users: state.users.len(),
    };

    Json(json!({
        "success": true,
        "status": "operational",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "system": system,
    }))
}

/// OpenAPI document (GET /api-docs.json), public.
pub async fn api_docs() -> ServerResult<impl IntoResponse> {
    let doc = openapi::document(API_KEY_HEADER)
        .and_then(serde_json::to_value)
        .map_err(|e| ServerError::Internal(format!("serializing OpenAPI document: {e}")))?;
    Ok(Json(doc))
}

/// 404 Not Found handler
pub async fn not_found(uri: Uri) -> ServerError {
    ServerError::RouteNotFound {
        path: uri.path().to_string(),
    }
}
