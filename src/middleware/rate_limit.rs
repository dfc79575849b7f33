//! Per-identity rate limiting middleware.
//!
//! Every request under `/v1` is counted against a fixed 60 second window
//! belonging to its identity:
//! - `key:<api key>` when the request carries a non-empty `x-api-key` header
//! - `ip:<peer address>` otherwise
//!
//! The header is inspected directly, so the limiter does not depend on the
//! auth middleware having run (and an unknown key is still throttled).
//!
//! # Response Headers
//!
//! Every response in scope carries the IETF draft-7 rate limit headers:
//!
//! ```text
//! RateLimit-Policy: 60;w=60
//! RateLimit: limit=60, remaining=42, reset=17
//! ```
//!
//! Rejected requests also get `Retry-After: <seconds>`.

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{error::AppError, middleware::auth::extract_api_key, services::key_service};

/// Length of one counting window.
pub const WINDOW: Duration = Duration::from_secs(60);

const RATELIMIT: HeaderName = HeaderName::from_static("ratelimit");
const RATELIMIT_POLICY: HeaderName = HeaderName::from_static("ratelimit-policy");

/// Request count for one identity in its current window.
#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: Instant,
    count: u32,
}

/// Outcome of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the identity's window resets
    pub reset_after: Duration,
}

impl RateLimitDecision {
    /// Seconds until reset, rounded up.
    pub fn reset_secs(&self) -> u64 {
        self.reset_after.as_secs() + u64::from(self.reset_after.subsec_nanos() > 0)
    }
}

/// In-memory fixed window rate limiter.
///
/// Cloning is cheap and clones share state. The mutex is only held for the
/// map update, never across an `.await`, so concurrent requests for the same
/// identity are counted exactly.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    quota: u32,
    window: Duration,
    windows: Arc<Mutex<HashMap<String, Window>>>,
}

impl RateLimiter {
    /// Limiter allowing `quota` requests per identity per minute.
    pub fn new(quota: u32) -> Self {
        Self::with_window(quota, WINDOW)
    }

    pub fn with_window(quota: u32, window: Duration) -> Self {
        Self {
            quota,
            window,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn quota(&self) -> u32 {
        self.quota
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Count a request for `identity` now.
    pub fn check(&self, identity: &str) -> RateLimitDecision {
        self.check_at(identity, Instant::now())
    }

    /// Count a request for `identity` at `now`.
    ///
    /// A window starts with the identity's first request and lasts
    /// `self.window`; the first request at or after its end opens a new one.
    pub fn check_at(&self, identity: &str, now: Instant) -> RateLimitDecision {
        let mut windows = self.lock();
        let entry = windows.entry(identity.to_string()).or_insert(Window {
            started_at: now,
            count: 0,
        });

        if now.saturating_duration_since(entry.started_at) >= self.window {
            *entry = Window {
                started_at: now,
                count: 0,
            };
        }
        entry.count = entry.count.saturating_add(1);

        let elapsed = now.saturating_duration_since(entry.started_at);
        RateLimitDecision {
            allowed: entry.count <= self.quota,
            limit: self.quota,
            remaining: self.quota.saturating_sub(entry.count),
            reset_after: self.window.saturating_sub(elapsed),
        }
    }

    /// Drop windows that have ended. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let mut windows = self.lock();
        let before = windows.len();
        windows.retain(|_, w| now.saturating_duration_since(w.started_at) < self.window);
        before - windows.len()
    }

    /// Number of identities currently tracked.
    pub fn tracked_identities(&self) -> usize {
        self.lock().len()
    }

    /// Periodically purge ended windows so idle identities do not accumulate.
    pub fn spawn_sweeper(&self) -> tokio::task::JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(limiter.window);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = limiter.purge_expired();
                if removed > 0 {
                    tracing::debug!(removed, "Purged expired rate limit windows");
                }
            }
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Window>> {
        // Counters stay usable even if a holder panicked mid-update
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Identity a request is counted under.
pub fn identity_key(request: &Request) -> String {
    if let Some(api_key) = extract_api_key(request.headers()) {
        return format!("key:{api_key}");
    }

    match request.extensions().get::<ConnectInfo<SocketAddr>>() {
        Some(ConnectInfo(addr)) => format!("ip:{}", addr.ip()),
        None => "ip:unknown".to_string(),
    }
}

/// Rate limiting middleware.
///
/// # Flow
///
/// 1. Derive the identity from the request
/// 2. Count the request against the identity's window
/// 3. Over quota: return 429 without running the handler
/// 4. Otherwise run the handler
/// 5. Attach rate limit headers to the response either way
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let identity = identity_key(&request);
    let decision = limiter.check(&identity);

    let mut response = if decision.allowed {
        next.run(request).await
    } else {
        tracing::warn!(
            identity = %redact_identity(&identity),
            path = %request.uri().path(),
            "Rate limit exceeded"
        );
        AppError::RateLimited {
            retry_after_secs: decision.reset_secs(),
        }
        .into_response()
    };

    apply_rate_limit_headers(response.headers_mut(), &decision, limiter.window());
    response
}

fn apply_rate_limit_headers(headers: &mut HeaderMap, decision: &RateLimitDecision, window: Duration) {
    let policy = format!("{};w={}", decision.limit, window.as_secs());
    let state = format!(
        "limit={}, remaining={}, reset={}",
        decision.limit,
        decision.remaining,
        decision.reset_secs()
    );

    if let Ok(value) = HeaderValue::from_str(&policy) {
        headers.insert(RATELIMIT_POLICY, value);
    }
    if let Ok(value) = HeaderValue::from_str(&state) {
        headers.insert(RATELIMIT, value);
    }
}

fn redact_identity(identity: &str) -> String {
    match identity.strip_prefix("key:") {
        Some(api_key) => format!("key:{}", key_service::redact_key(api_key)),
        None => identity.to_string(),
    }
}
