//! Key service - issuance and validation of API keys.
//!
//! # Key Format
//!
//! `kapi_` followed by 24 alphanumeric characters drawn from the thread-local
//! CSPRNG (~142 bits of entropy). Only the SHA-256 hash of a key is stored,
//! so a leaked database does not leak usable keys.

use chrono::Utc;
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

use crate::{db::DbPool, error::AppError, models::api_key::ApiKey};

const KEY_PREFIX: &str = "kapi_";
const KEY_RANDOM_LEN: usize = 24;

/// Collisions are practically impossible; the retry only guards the primary key.
const MAX_ISSUE_ATTEMPTS: usize = 3;

/// Issue a new API key for a holder.
///
/// # Process
///
/// 1. Generate a random key
/// 2. Hash it with SHA-256
/// 3. Store the hash with holder metadata and the current time
/// 4. Return the plaintext key (the only time it is ever available)
///
/// # Errors
///
/// - `Database`: the insert failed, or every attempt collided with an existing key
pub async fn issue_key(
    pool: &DbPool,
    holder_name: &str,
    holder_email: &str,
) -> Result<String, AppError> {
    for attempt in 1..=MAX_ISSUE_ATTEMPTS {
        let api_key = generate_api_key();
        let record = ApiKey {
            key_hash: hash_api_key(&api_key),
            holder_name: holder_name.to_string(),
            holder_email: holder_email.to_string(),
            created_at: Utc::now(),
        };

        let result = sqlx::query(
            "INSERT INTO api_keys (key_hash, holder_name, holder_email, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&record.key_hash)
        .bind(&record.holder_name)
        .bind(&record.holder_email)
        .bind(record.created_at)
        .execute(pool)
        .await;

        match result {
            Ok(_) => {
                tracing::info!(
                    key = %redact_key(&api_key),
                    holder = %record.holder_name,
                    "API key issued"
                );
                return Ok(api_key);
            }
            Err(err) if is_unique_violation(&err) => {
                tracing::warn!(attempt, "Generated API key collided, retrying");
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(AppError::Database(sqlx::Error::Protocol(
        "could not generate a unique API key".to_string(),
    )))
}

/// Check whether `api_key` was issued.
///
/// Exact match only: the caller is responsible for trimming whitespace.
/// The lookup is by hash, so query time does not depend on how much of the
/// key a guess gets right.
pub async fn is_valid_key(pool: &DbPool, api_key: &str) -> Result<bool, AppError> {
    let found: Option<String> =
        sqlx::query_scalar("SELECT key_hash FROM api_keys WHERE key_hash = ? LIMIT 1")
            .bind(hash_api_key(api_key))
            .fetch_optional(pool)
            .await?;

    Ok(found.is_some())
}

/// Shortened form of a key that is safe to write to logs.
pub fn redact_key(api_key: &str) -> String {
    let visible: String = api_key.chars().take(KEY_PREFIX.len() + 4).collect();
    format!("{visible}…")
}

fn generate_api_key() -> String {
    let random: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(KEY_RANDOM_LEN)
        .map(char::from)
        .collect();
    format!("{KEY_PREFIX}{random}")
}

/// SHA-256 of the key, hex encoded (64 characters).
fn hash_api_key(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hex::encode(hasher.finalize())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use std::collections::HashSet;

    async fn test_pool() -> DbPool {
        let pool = db::create_pool("sqlite::memory:").await.unwrap();
        db::run_migrations(&pool).await.unwrap();
        pool
    }

    #[test]
    fn generated_keys_have_expected_shape() {
        let key = generate_api_key();
        assert!(key.starts_with(KEY_PREFIX));
        assert_eq!(key.len(), KEY_PREFIX.len() + KEY_RANDOM_LEN);
        assert!(key[KEY_PREFIX.len()..].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn redacted_key_hides_the_secret_part() {
        let redacted = redact_key("kapi_abcdefghijklmnopqrstuvwx");
        assert_eq!(redacted, "kapi_abcd…");
    }

    #[tokio::test]
    async fn issued_keys_are_unique_and_each_valid() {
        let pool = test_pool().await;

        let mut keys = HashSet::new();
        for i in 0..50 {
            let key = issue_key(&pool, &format!("holder {i}"), "holder@example.com")
                .await
                .unwrap();
            assert!(keys.insert(key));
        }

        for key in &keys {
            assert!(is_valid_key(&pool, key).await.unwrap());
        }
    }

    #[tokio::test]
    async fn altered_keys_are_rejected() {
        let pool = test_pool().await;
        let key = issue_key(&pool, "Ada", "ada@example.com").await.unwrap();

        let truncated = &key[..key.len() - 1];
        let extended = format!("{key}x");
        let uppercased = key.to_uppercase();
        let padded = format!(" {key}");

        assert!(is_valid_key(&pool, &key).await.unwrap());
        assert!(!is_valid_key(&pool, truncated).await.unwrap());
        assert!(!is_valid_key(&pool, &extended).await.unwrap());
        assert!(!is_valid_key(&pool, &uppercased).await.unwrap());
        assert!(!is_valid_key(&pool, &padded).await.unwrap());
        assert!(!is_valid_key(&pool, "").await.unwrap());
    }

    #[tokio::test]
    async fn only_the_hash_is_stored() {
        let pool = test_pool().await;
        let key = issue_key(&pool, "Ada", "ada@example.com").await.unwrap();

        let record = sqlx::query_as::<_, ApiKey>(
            "SELECT key_hash, holder_name, holder_email, created_at FROM api_keys",
        )
        .fetch_one(&pool)
        .await
        .unwrap();

        assert_eq!(record.key_hash, hash_api_key(&key));
        assert_ne!(record.key_hash, key);
        assert_eq!(record.holder_name, "Ada");
        assert_eq!(record.holder_email, "ada@example.com");
    }
}
