//! Business logic services.
//!
//! Services contain the data-access logic separated from HTTP handlers.
//! Each one owns its table: nothing else writes to `api_keys` or `movies`.

pub mod key_service;
pub mod movie_service;
