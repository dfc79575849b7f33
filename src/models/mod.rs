//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables,
//! together with the request/response bodies built from them.

/// API key issuance model
pub mod api_key;
/// Movie catalog model
pub mod movie;
