//! Server initialization and routing
//!
//! This module handles the Axum server setup including:
//! - Router configuration with all API endpoints
//! - Middleware stack (auth, rate limiting, logging, CORS, etc.)
//! - Graceful shutdown handling
//! - Panic recovery

use crate::config::{ServerConfig, DEFAULT_API_KEY};
use crate::error::ServerError;
use crate::middleware::{api_key_auth, log_requests, rate_limit, request_id};
use crate::routes::{api_docs, api_info, health, not_found, system_status, users, welcome};
use crate::state::ServerState;
use crate::telemetry::init_tracing;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderName, HeaderValue, Method, StatusCode};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// How long in-flight requests may drain after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };
    ServerError::Internal(format!("handler panicked: {detail}")).into_response()
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    // validate() already rejected unparsable origins
    let origins = config.cors_header_values().unwrap_or_default();
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(crate::middleware::API_KEY_HEADER),
        ])
}

/// Build the Axum router with all routes and middleware
///
/// Routes are divided into:
/// - Public routes: /, /health, /ready, /api-docs.json (no auth required)
/// - Protected routes: All /api/v1/* endpoints (API key required)
///
/// Unmatched paths, and registered paths called with a method they do
/// not serve, fall through to a public 404.
pub fn build_router(state: Arc<ServerState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/", get(welcome))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/api-docs.json", get(api_docs));

    // Protected routes (require API key)
    let protected_routes = Router::new()
        .route("/api/v1/info", get(api_info))
        .route("/api/v1/status", get(system_status))
        .route(
            "/api/v1/users",
            get(users::list_users).post(users::create_user),
        )
        .route("/api/v1/users/search", get(users::search_users))
        .route(
            "/api/v1/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .layer(from_fn_with_state(state.clone(), api_key_auth));

    // Layers run outermost-last: TraceLayer sees the request first.
    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .layer(DefaultBodyLimit::max(state.config.max_body_size()))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.timeout(),
        ))
        .layer(CompressionLayer::new())
        .layer(from_fn_with_state(state.clone(), rate_limit))
        .layer(cors_layer(&state.config))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(from_fn(log_requests))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the userhub HTTP server
///
/// Initializes logging, creates the shared state (user store, rate limiter),
/// binds the configured address and serves until SIGTERM or Ctrl+C. After a
/// signal, in-flight requests get [`SHUTDOWN_GRACE`] to finish before the
/// process exits with a failure status.
///
/// ```rust,no_run
/// use server::ServerConfig;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = ServerConfig::load()?;
///     server::start_server(config).await?;
///     Ok(())
/// }
/// ```
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    init_tracing(&config.log_level);

    if config.api_key == DEFAULT_API_KEY {
        tracing::warn!("No API key configured, using the development default");
    }

    // Create server state
    let state = Arc::new(ServerState::new(config.clone())?);
    spawn_rate_limit_pruner(state.clone());
    let app = build_router(state);
    let addr: SocketAddr = config.socket_addr()?;

    tracing::info!(
        %addr,
        environment = %config.environment,
        "Server is running"
    );
    tracing::info!(
        window_secs = config.rate_limit_window_secs,
        max_requests = config.rate_limit_max_requests,
        timeout_secs = config.timeout_secs,
        cors_origins = ?config.cors_origins,
        "Limits configured"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("HTTP server closed");
    Ok(())
}

/// Evict expired rate-limit windows once per window length.
fn spawn_rate_limit_pruner(state: Arc<ServerState>) {
    let period = state.config.rate_limit_window();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = state.prune_rate_limits();
            if removed > 0 {
                tracing::debug!(removed, "pruned expired rate limit windows");
            }
        }
    });
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("SIGINT signal received: closing HTTP server"),
        _ = terminate => tracing::info!("SIGTERM signal received: closing HTTP server"),
    }

    tokio::spawn(async {
        tokio::time::sleep(SHUTDOWN_GRACE).await;
        tracing::error!("Could not close connections in time, forcefully shutting down");
        std::process::exit(1);
    });
}
