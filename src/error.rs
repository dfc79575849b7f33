//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value, json};

/// Where callers without a credential are told to get one.
pub const API_KEY_HINT: &str =
    "Issue a key with POST /portal/keys, then send it in the header x-api-key: <YOUR_KEY>";

/// Application-wide error type.
///
/// This enum represents all possible errors that can occur in the application.
/// Each variant maps to a specific HTTP status code and error message.
///
/// # Error Categories
///
/// - **Database Errors**: Any sqlx::Error from database operations
/// - **Authentication Errors**: Missing or unrecognized API keys
/// - **Throttling Errors**: Rate limit exceeded
/// - **Resource Errors**: Requested movie or route not found
/// - **Validation Errors**: Invalid request data
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    ///
    /// Returns HTTP 500. Details are logged, never sent to the client.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// No `x-api-key` header, or an empty one.
    ///
    /// Returns HTTP 401 Unauthorized with a hint on obtaining a key.
    #[error("API key required")]
    MissingApiKey,

    /// An API key was supplied but was never issued.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("Invalid API key")]
    InvalidApiKey,

    /// Caller exceeded its request quota for the current window.
    ///
    /// Returns HTTP 429 Too Many Requests with a `Retry-After` header.
    #[error("Too many requests, please slow down")]
    RateLimited { retry_after_secs: u64 },

    /// Requested movie does not exist.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Movie not found")]
    MovieNotFound,

    /// No route matches the request path.
    #[error("Not found")]
    RouteNotFound,

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String contains details about what was invalid.
    #[error("Invalid request")]
    InvalidRequest(String),
}

/// Convert AppError into an HTTP response.
///
/// This implementation allows Axum handlers to return `Result<T, AppError>`
/// and have errors automatically converted to proper HTTP responses.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// `missing_api_key` errors additionally carry a `hint` field.
///
/// # Status Code Mapping
///
/// - `InvalidRequest` → 400 Bad Request
/// - `MissingApiKey` → 401 Unauthorized
/// - `InvalidApiKey` → 403 Forbidden
/// - `MovieNotFound`, `RouteNotFound` → 404 Not Found
/// - `RateLimited` → 429 Too Many Requests
/// - `Database` → 500 Internal Server Error (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Map each error variant to (HTTP status, error code, message)
        let (status, code, message) = match self {
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::MissingApiKey => (
                StatusCode::UNAUTHORIZED,
                "missing_api_key",
                self.to_string(),
            ),
            AppError::InvalidApiKey => {
                (StatusCode::FORBIDDEN, "invalid_api_key", self.to_string())
            }
            AppError::MovieNotFound => {
                (StatusCode::NOT_FOUND, "movie_not_found", self.to_string())
            }
            AppError::RouteNotFound => (StatusCode::NOT_FOUND, "not_found", self.to_string()),
            AppError::RateLimited { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                self.to_string(),
            ),
            AppError::Database(ref err) => {
                tracing::error!(error = %err, "Unhandled database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let mut error = Map::new();
        error.insert("code".to_string(), Value::from(code));
        error.insert("message".to_string(), Value::from(message));
        if matches!(self, AppError::MissingApiKey) {
            error.insert("hint".to_string(), Value::from(API_KEY_HINT));
        }

        let mut response = (status, Json(json!({ "error": error }))).into_response();

        if let AppError::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }

        response
    }
}

/// Body used when a handler panics; same shape as [`AppError`] 500s.
pub fn panic_response(_panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
    tracing::error!("Handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": {
                "code": "internal_error",
                "message": "An internal error occurred"
            }
        })),
    )
        .into_response()
}
