use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use userhub::StoreError;

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
///
/// Closed set: [`ServerError::status_code`] and the response body are total
/// functions over these variants.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("API key is required. Please provide X-API-Key header.")]
    Unauthenticated,

    #[error("Invalid API key.")]
    Forbidden,

    #[error("Route not found")]
    RouteNotFound { path: String },

    #[error("Too many requests from this IP, please try again later.")]
    RateLimitExceeded { retry_after_secs: u64 },

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Body shared by every error response.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ServerError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) | ServerError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            ServerError::Conflict(_) => StatusCode::CONFLICT,
            ServerError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ServerError::Forbidden => StatusCode::FORBIDDEN,
            ServerError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            ServerError::Internal(_) | ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorResponse {
        let mut body = ErrorResponse {
            success: false,
            message: self.to_string(),
            status: None,
            status_code: None,
            path: None,
        };

        match self {
            ServerError::Unauthenticated | ServerError::Forbidden => {
                body.status = Some("error".to_string());
                body.status_code = Some(self.status_code().as_u16());
            }
            ServerError::RouteNotFound { path } => {
                body.status = Some("error".to_string());
                body.path = Some(path.clone());
            }
            // Never leak internals to the client
            ServerError::Internal(_) | ServerError::Config(_) => {
                body.message = "Internal server error".to_string();
            }
            ServerError::BadRequest(_)
            | ServerError::NotFound(_)
            | ServerError::Conflict(_)
            | ServerError::RateLimitExceeded { .. } => {}
        }

        body
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let mut response = (status, Json(self.body())).into_response();
        if let ServerError::RateLimitExceeded { retry_after_secs } = self {
            response
                .headers_mut()
                .insert("retry-after", HeaderValue::from(retry_after_secs));
        }
        response
    }
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidArgument(msg) => ServerError::BadRequest(msg),
            StoreError::NotFound(msg) => ServerError::NotFound(msg),
            StoreError::Conflict(msg) => ServerError::Conflict(msg),
        }
    }
}

impl From<JsonRejection> for ServerError {
    fn from(err: JsonRejection) -> Self {
        ServerError::BadRequest(format!("Invalid JSON body: {}", err.body_text()))
    }
}

impl From<QueryRejection> for ServerError {
    fn from(err: QueryRejection) -> Self {
        ServerError::BadRequest(format!("Invalid query string: {}", err.body_text()))
    }
}
