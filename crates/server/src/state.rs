use crate::config::ServerConfig;
use crate::error::ServerResult;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use subtle::ConstantTimeEq;
use userhub::UserStore;

/// A dependency probed by `GET /ready`.
///
/// The server registers none by default, which makes it statically ready.
/// Anything that must be reachable before traffic is accepted implements
/// this and is added with [`ServerState::with_readiness_check`].
pub trait ReadinessCheck: Send + Sync {
    fn name(&self) -> &str;
    fn is_ready(&self) -> bool;
}

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// The user collection (shared across requests)
    pub users: Arc<UserStore>,

    /// Rate limit tracking: client IP -> (count, window_start)
    pub rate_limiter: Arc<DashMap<String, (u32, Instant)>>,

    readiness: Vec<Arc<dyn ReadinessCheck>>,

    started_at: Instant,
}

impl ServerState {
    /// Create new server state
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        config.validate()?;

        let users = if config.seed_demo_users {
            UserStore::with_demo_users()
        } else {
            UserStore::new()
        };

        Ok(Self::with_store(config, users))
    }

    /// Build state around an existing store.
    pub fn with_store(config: ServerConfig, users: UserStore) -> Self {
        Self {
            config: Arc::new(config),
            users: Arc::new(users),
            rate_limiter: Arc::new(DashMap::new()),
            readiness: Vec::new(),
            started_at: Instant::now(),
        }
    }

    pub fn with_readiness_check(mut self, check: Arc<dyn ReadinessCheck>) -> Self {
        self.readiness.push(check);
        self
    }

    /// Result of every registered readiness check, in registration order.
    pub fn readiness(&self) -> Vec<(String, bool)> {
        self.readiness
            .iter()
            .map(|c| (c.name().to_string(), c.is_ready()))
            .collect()
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Check if API key is valid. Constant time in the key contents.
    pub fn is_valid_api_key(&self, key: &str) -> bool {
        key.as_bytes()
            .ct_eq(self.config.api_key.as_bytes())
            .into()
    }

    /// Count a request from `client` against the fixed window.
    ///
    /// Returns `Err(retry_after_secs)` once the window's budget is spent.
    pub fn check_rate_limit(&self, client: &str) -> Result<(), u64> {
        let now = Instant::now();
        let window = self.config.rate_limit_window();
        let limit = self.config.rate_limit_max_requests;

        let mut entry = self
            .rate_limiter
            .entry(client.to_string())
            .or_insert((0, now));
        let (count, window_start) = entry.value_mut();

        // Reset if window has passed
        if now.duration_since(*window_start) >= window {
            *count = 0;
            *window_start = now;
        }

        if *count >= limit {
            let remaining = window.saturating_sub(now.duration_since(*window_start));
            return Err(remaining.as_secs().max(1));
        }

        *count += 1;
        Ok(())
    }

    /// Drop clients whose window has elapsed. Returns how many were removed.
    pub fn prune_rate_limits(&self) -> usize {
        let now = Instant::now();
        let window = self.config.rate_limit_window();
        let before = self.rate_limiter.len();
        self.rate_limiter
            .retain(|_, (_, window_start)| now.duration_since(*window_start) < window);
        before.saturating_sub(self.rate_limiter.len())
    }
}
