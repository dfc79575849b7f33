//! Key issuance endpoint.
//!
//! `POST /portal/keys` is open to everyone and is not rate limited.

use axum::{Json, extract::State, http::StatusCode};

use crate::{
    db::DbPool,
    error::AppError,
    handlers::json::JsonBody,
    models::api_key::{IssueKeyRequest, IssuedKeyResponse},
    services::key_service,
};

/// Issue a new API key.
///
/// # Request Body
///
/// ```json
/// {
///   "name": "Ada Lovelace",
///   "email": "ada@example.com"
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: `{ "apiKey": "...", "note": "...", "docs": "/docs" }`
/// - **Error (400)**: `name` or `email` missing or blank, or the body is not a JSON object
/// - **Error (500)**: Database error
pub async fn issue_key(
    State(pool): State<DbPool>,
    JsonBody(request): JsonBody<IssueKeyRequest>,
) -> Result<(StatusCode, Json<IssuedKeyResponse>), AppError> {
    let name = request.name.as_deref().map(str::trim).unwrap_or_default();
    let email = request.email.as_deref().map(str::trim).unwrap_or_default();

    if name.is_empty() || email.is_empty() {
        return Err(AppError::InvalidRequest(
            "name and email are required".to_string(),
        ));
    }

    let api_key = key_service::issue_key(&pool, name, email).await?;

    Ok((StatusCode::CREATED, Json(IssuedKeyResponse::new(api_key))))
}
