//! HTTP middleware components.
//!
//! Middleware are functions that run before route handlers.
//! They can:
//! - Throttle requests per caller
//! - Authenticate requests
//! - Short-circuit requests (reject throttled or unauthorized callers)

/// API key authentication middleware
pub mod auth;
/// Per-identity rate limiting middleware
pub mod rate_limit;
