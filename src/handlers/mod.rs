//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, etc.)
//! 2. Validates it and calls a service
//! 3. Returns HTTP response (JSON, status code)

/// Health check endpoint
pub mod health;
/// Request body extractor
pub mod json;
/// Movie catalog endpoints
pub mod movies;
/// API key issuance endpoint
pub mod portal;

use crate::error::AppError;

/// Fallback for unmatched routes.
pub async fn not_found() -> AppError {
    AppError::RouteNotFound
}
