//! Database connection pool, migration and seeding management.
//!
//! This module provides utilities for:
//! - Creating and managing a SQLite connection pool
//! - Running database migrations automatically
//! - Seeding an empty catalog with sample movies

use std::str::FromStr;

use chrono::Utc;
use sqlx::{
    Pool, Sqlite,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};

use crate::models::movie::encode_genres;

/// Type alias for SQLite connection pool.
///
/// Instead of writing `Pool<Sqlite>` everywhere, we can use `DbPool`.
pub type DbPool = Pool<Sqlite>;

/// Create a new SQLite connection pool.
///
/// The database file (and its parent directory) is created when missing.
/// WAL journaling and foreign keys are enabled on every connection.
///
/// In-memory databases live only as long as their connection, so they are
/// served from a single connection that is never reaped.
///
/// # Errors
///
/// Returns an error if:
/// - The connection string is invalid
/// - The database file cannot be created or opened
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let in_memory = database_url.contains(":memory:");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let options = if in_memory {
        options
    } else {
        options.journal_mode(SqliteJournalMode::Wal)
    };

    if !in_memory {
        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
    }

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    pool_options.connect_with(options).await
}

/// Name of the database file behind a connection string, for diagnostics.
///
/// `sqlite://data/app.db?mode=rwc` yields `app.db`; in-memory URLs yield `:memory:`.
pub fn database_name(database_url: &str) -> String {
    if database_url.contains(":memory:") {
        return ":memory:".to_string();
    }

    let path = database_url
        .trim_start_matches("sqlite:")
        .trim_start_matches("//");
    let path = path.split('?').next().unwrap_or(path);

    std::path::Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

/// Run database migrations from the `migrations/` directory.
///
/// Migrations are tracked in the `_sqlx_migrations` table, so each migration runs only once.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    // The macro reads migrations at compile time from ./migrations directory
    sqlx::migrate!("./migrations").run(pool).await
}

/// Sample catalog inserted into an empty database: (id, title, year, rating, genres, plot).
const SAMPLE_MOVIES: &[(&str, &str, i64, f64, &[&str], &str)] = &[
    (
        "mv_inception",
        "Inception",
        2010,
        8.8,
        &["Action", "Sci-Fi"],
        "A thief enters dreams to steal secrets, then gets a chance to erase his past.",
    ),
    (
        "mv_interstellar",
        "Interstellar",
        2014,
        8.7,
        &["Adventure", "Sci-Fi"],
        "A team travels through a wormhole searching for a new home for humanity.",
    ),
    (
        "mv_darkknight",
        "The Dark Knight",
        2008,
        9.0,
        &["Action", "Crime"],
        "Batman faces the Joker, who pushes Gotham into chaos.",
    ),
    (
        "mv_spiritedaway",
        "Spirited Away",
        2001,
        8.6,
        &["Animation", "Fantasy"],
        "A girl enters a spirit world to save her parents.",
    ),
    (
        "mv_parasite",
        "Parasite",
        2019,
        8.5,
        &["Drama", "Thriller"],
        "A poor family schemes to infiltrate a wealthy household.",
    ),
    (
        "mv_whiplash",
        "Whiplash",
        2014,
        8.5,
        &["Drama", "Music"],
        "A young drummer clashes with a ruthless teacher to reach greatness.",
    ),
    (
        "mv_matrix",
        "The Matrix",
        1999,
        8.7,
        &["Action", "Sci-Fi"],
        "A hacker discovers reality is a simulation and fights to free humanity.",
    ),
    (
        "mv_godfather",
        "The Godfather",
        1972,
        9.2,
        &["Crime", "Drama"],
        "A mafia patriarch transfers control to his reluctant son.",
    ),
];

/// Insert the sample catalog if the movies table is empty.
///
/// Returns the number of movies inserted (0 when the table already had rows).
pub async fn seed_sample_movies(pool: &DbPool) -> Result<usize, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM movies")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(0);
    }

    let now = Utc::now();
    let mut tx = pool.begin().await?;
    for (id, title, year, rating, genres, plot) in SAMPLE_MOVIES {
        let genres: Vec<String> = genres.iter().map(|g| g.to_string()).collect();
        sqlx::query(
            "INSERT INTO movies (id, title, year, rating, genres, plot, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(*id)
        .bind(*title)
        .bind(*year)
        .bind(*rating)
        .bind(encode_genres(&genres))
        .bind(*plot)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    Ok(SAMPLE_MOVIES.len())
}
