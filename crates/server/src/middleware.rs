use crate::error::ServerError;
use crate::state::ServerState;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use std::net::SocketAddr;
use std::sync::Arc;

/// Header carrying the shared secret.
pub const API_KEY_HEADER: &str = "x-api-key";

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Number of leading characters of a rejected key kept in audit logs.
const KEY_PREFIX_LEN: usize = 5;

fn redact_key(key: &[u8]) -> String {
    let visible: String = String::from_utf8_lossy(key)
        .chars()
        .take(KEY_PREFIX_LEN)
        .collect();
    format!("{visible}***")
}

/// API Key authentication middleware
///
/// Missing or empty header: 401. Present but not equal to the configured
/// secret: 403.
/// In both cases the downstream handler never runs.
pub async fn api_key_auth(
    State(state): State<Arc<ServerState>>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let Some(value) = request
        .headers()
        .get(API_KEY_HEADER)
        .filter(|v| !v.is_empty())
    else {
        tracing::warn!(%method, %path, "API request without API key");
        return Err(ServerError::Unauthenticated);
    };

    // A value that is not visible ASCII can never equal the secret
    let valid = value
        .to_str()
        .map(|key| state.is_valid_api_key(key))
        .unwrap_or(false);

    if !valid {
        tracing::warn!(
            %method,
            %path,
            provided_key = %redact_key(value.as_bytes()),
            "API request with invalid API key"
        );
        return Err(ServerError::Forbidden);
    }

    tracing::debug!(%method, %path, "API request authenticated successfully");
    Ok(next.run(request).await)
}

/// Best-effort client address: socket peer, then `X-Forwarded-For`.
fn client_key(request: &Request) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Fixed-window request limiter keyed by client IP
pub async fn rate_limit(
    State(state): State<Arc<ServerState>>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let client = client_key(&request);

    if let Err(retry_after_secs) = state.check_rate_limit(&client) {
        tracing::warn!(client = %client, "rate limit exceeded");
        return Err(ServerError::RateLimitExceeded { retry_after_secs });
    }

    Ok(next.run(request).await)
}

/// Newtype so the id doesn't collide with other `String` extensions.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Request ID injection middleware
pub async fn request_id(mut request: Request, next: Next) -> Response {
    // Generate or extract request ID
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    // Add to request extensions for handlers to access
    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// Logging middleware
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();

    tracing::info!(
        method = %method,
        uri = %uri,
        request_id = %request_id,
        "Request started"
    );

    let response = next.run(request).await;
    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = %duration.as_millis(),
        request_id = %request_id,
        "Request completed"
    );

    response
}
