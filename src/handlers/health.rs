//! Health check endpoint for service monitoring.

use crate::state::AppState;
use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Name reported in health responses.
pub const SERVICE_NAME: &str = "Movies Open API (SQLite)";

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always true when the process can answer
    pub ok: bool,

    pub service: &'static str,

    /// Database file name
    pub db: String,

    /// Current server timestamp
    pub time: DateTime<Utc>,
}

/// Health check handler.
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "ok": true,
///   "service": "Movies Open API (SQLite)",
///   "db": "app.db",
///   "time": "2025-12-21T19:00:00Z"
/// }
/// ```
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        service: SERVICE_NAME,
        db: state.db_name,
        time: Utc::now(),
    })
}
