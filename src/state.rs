//! Shared application state.
//!
//! Built once at startup and handed to the router; handlers and middleware
//! pull out the part they need through `State<T>`.

use axum::extract::FromRef;

use crate::{db::DbPool, middleware::rate_limit::RateLimiter};

#[derive(Debug, Clone)]
pub struct AppState {
    /// Shared SQLite pool, used by every store operation
    pub pool: DbPool,

    pub limiter: RateLimiter,

    /// Database file name reported by the health check
    pub db_name: String,
}

impl AppState {
    pub fn new(pool: DbPool, limiter: RateLimiter, db_name: impl Into<String>) -> Self {
        Self {
            pool,
            limiter,
            db_name: db_name.into(),
        }
    }
}

impl FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for RateLimiter {
    fn from_ref(state: &AppState) -> Self {
        state.limiter.clone()
    }
}
