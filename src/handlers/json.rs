//! JSON request body extractor that reports failures as `AppError`.
//!
//! `axum::Json` answers bad bodies itself (415, 422, or a plain-text 400
//! carrying the serde message). Handlers use [`JsonBody`] instead so every
//! body problem is a 400 in the standard error shape.
//!
//! An absent body, or a literal `null`, is read as `{}`. The handler's own
//! field checks then decide what is missing. The `Content-Type` header is
//! not checked.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use serde_json::{Value, error::Category};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|rejection| {
            tracing::debug!(%rejection, "Failed to read request body");
            AppError::InvalidRequest("request body could not be read".to_string())
        })?;

        parse_body(&bytes).map(JsonBody)
    }
}

fn parse_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, AppError> {
    let value = if bytes.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Default::default())
    } else {
        match serde_json::from_slice(bytes).map_err(body_error)? {
            Value::Null => Value::Object(Default::default()),
            value => value,
        }
    };

    serde_json::from_value(value).map_err(body_error)
}

/// Map a serde error to a 400 without echoing parser details.
fn body_error(err: serde_json::Error) -> AppError {
    tracing::debug!(error = %err, "Rejected request body");

    let message = match err.classify() {
        Category::Data => "request body has a field of the wrong type",
        Category::Syntax | Category::Eof | Category::Io => "request body must be valid JSON",
    };
    AppError::InvalidRequest(message.to_string())
}
