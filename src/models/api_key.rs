//! API Key model for authentication.
//!
//! API keys let callers write to the movie catalog. They are stored in the database as SHA-256 hashes; the plaintext key is shown exactly once, when it is issued.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents an API key record from the database.
///
/// # Database Table
///
/// Maps to the `api_keys` table with columns:
/// - `key_hash`: SHA-256 hash of the actual API key (primary key)
/// - `holder_name`: Name of the person or team the key was issued to
/// - `holder_email`: Contact email of the holder
/// - `created_at`: When the key was issued
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApiKey {
    /// SHA-256 hash of the actual API key (64 hex characters)
    pub key_hash: String,

    pub holder_name: String,

    pub holder_email: String,

    /// Timestamp when this API key was issued
    pub created_at: DateTime<Utc>,
}

/// Request body for `POST /portal/keys`.
///
/// Both fields are optional at the serde level so that a missing field is
/// reported as a 400 by the handler rather than as a body rejection.
#[derive(Debug, Default, Deserialize)]
pub struct IssueKeyRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Response body for a freshly issued key.
///
/// # JSON Example
///
/// ```json
/// {
///   "apiKey": "kapi_Yb3kQ0m1...",
///   "note": "Store this key somewhere safe. If you lose it, issue a new one.",
///   "docs": "/docs"
/// }
/// ```
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedKeyResponse {
    pub api_key: String,
    pub note: &'static str,
    pub docs: &'static str,
}

impl IssuedKeyResponse {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            note: "Store this key somewhere safe. If you lose it, issue a new one.",
            docs: "/docs",
        }
    }
}
