//! userhub server - HTTP REST API over the in-memory user directory
//!
//! This crate exposes [`userhub::UserStore`] through an axum router:
//!
//! - **Users**: list, search, get, create, update and delete
//! - **Health**: liveness and readiness probes
//! - **Docs**: a hand-built OpenAPI document
//!
//! # Features
//!
//! - **Authentication**: shared-secret `X-API-Key` header on `/api/v1/*`
//! - **Rate limiting**: fixed window per client IP
//! - **Middleware**: compression, CORS, security headers, request ID
//!   tracking, structured JSON logging, panic recovery
//! - **Configuration**: `.env`, optional `userhub.*` file, `USERHUB_*`
//!   environment variables
//! - **Graceful Shutdown**: SIGTERM / Ctrl+C with a bounded drain period
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! ## Public Endpoints (No Authentication)
//!
//! - `GET /` - Welcome message
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /api-docs.json` - OpenAPI document
//!
//! ## Protected Endpoints (API Key Required)
//!
//! - `GET /api/v1/info` - API metadata
//! - `GET /api/v1/status` - Process status
//! - `GET /api/v1/users` - List users
//! - `GET /api/v1/users/search?name=` - Search users by name
//! - `GET /api/v1/users/{id}` - Get user
//! - `POST /api/v1/users` - Create user
//! - `PUT /api/v1/users/{id}` - Update user
//! - `DELETE /api/v1/users/{id}` - Delete user

pub mod config;
pub mod error;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod state;
pub mod telemetry;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::{ReadinessCheck, ServerState};
