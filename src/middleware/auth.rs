//! API key authentication middleware.
//!
//! This middleware intercepts every protected request to:
//! 1. Extract the API key from the `x-api-key` header
//! 2. Verify it was issued, via the key service
//! 3. Inject authentication context into the request
//! 4. Reject requests with HTTP 401 (no key) or 403 (unknown key)

use crate::{db::DbPool, error::AppError, services::key_service};
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

/// Header carrying the caller's API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Authentication context attached to authenticated requests.
///
/// This struct is inserted into the request's extension map and can be
/// extracted by route handlers to know who made the request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The validated API key, exactly as presented (after trimming)
    pub api_key: String,
}

/// Read the API key from request headers.
///
/// Surrounding whitespace is trimmed. A missing header, a header that is not
/// valid visible ASCII, or an empty value all mean "no credential".
pub fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
}

/// API key authentication middleware function.
///
/// # Flow
///
/// 1. Extract `x-api-key: <key>` header from request
/// 2. If absent: return 401 Unauthorized with a hint
/// 3. Look the key up through the key service
/// 4. If unknown: return 403 Forbidden
/// 5. If found: inject `AuthContext` into request, call next handler
///
/// Database failures during the lookup surface as 500, never as 401/403.
pub async fn auth_middleware(
    State(pool): State<DbPool>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let api_key = extract_api_key(request.headers()).ok_or_else(|| {
        tracing::debug!(path = %request.uri().path(), "Request without API key");
        AppError::MissingApiKey
    })?;

    if !key_service::is_valid_key(&pool, &api_key).await? {
        tracing::warn!(
            key = %key_service::redact_key(&api_key),
            path = %request.uri().path(),
            "Rejected unknown API key"
        );
        return Err(AppError::InvalidApiKey);
    }

    // Route handlers can now extract this using Extension<AuthContext>
    request.extensions_mut().insert(AuthContext { api_key });

    Ok(next.run(request).await)
}
