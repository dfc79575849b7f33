//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (optional): SQLite connection string, defaults to `sqlite://data/app.db`
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `RATE_LIMIT_PER_MINUTE` (optional): request quota per identity per minute, defaults to 60
/// - `SEED_SAMPLE_DATA` (optional): insert sample movies into an empty catalog, defaults to true
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,

    #[serde(default = "default_seed")]
    pub seed_sample_data: bool,
}

fn default_database_url() -> String {
    "sqlite://data/app.db".to_string()
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_rate_limit() -> u32 {
    60
}

fn default_seed() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            server_port: default_port(),
            rate_limit_per_minute: default_rate_limit(),
            seed_sample_data: default_seed(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable value cannot be parsed into
    /// its expected type (e.g. `SERVER_PORT=abc`).
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are automatically converted: rate_limit_per_minute -> RATE_LIMIT_PER_MINUTE
        Self::from_vars(std::env::vars())
    }

    /// Build a configuration from an explicit set of key/value pairs.
    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_vars(vars(&[])).unwrap();
        assert_eq!(config.database_url, "sqlite://data/app.db");
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.rate_limit_per_minute, 60);
        assert!(config.seed_sample_data);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_vars(vars(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("SERVER_PORT", "8080"),
            ("RATE_LIMIT_PER_MINUTE", "5"),
            ("SEED_SAMPLE_DATA", "false"),
        ]))
        .unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.rate_limit_per_minute, 5);
        assert!(!config.seed_sample_data);
    }

    #[test]
    fn invalid_quota_is_rejected() {
        assert!(Config::from_vars(vars(&[("RATE_LIMIT_PER_MINUTE", "lots")])).is_err());
    }
}
