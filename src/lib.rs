//! Movies Open API
//!
//! A public REST API over a movie catalog. Anyone may read; writes require
//! an API key issued through the open portal endpoint. Every `/v1` request
//! is rate limited per API key, or per caller address when no key is sent.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: SQLite with sqlx (async queries)
//! - **Authentication**: `x-api-key` header, keys stored as SHA-256 hashes
//! - **Throttling**: in-process fixed window counters
//! - **Format**: JSON requests/responses
//!
//! # Request Pipeline
//!
//! rate limit → auth (write routes only) → handler → service → response

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::{config::Config, middleware::rate_limit::RateLimiter, state::AppState};

/// Open the database, bring its schema up to date and build the shared state.
///
/// Sample movies are inserted into an empty catalog when the configuration asks for it.
pub async fn init_state(config: &Config) -> anyhow::Result<AppState> {
    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    if config.seed_sample_data {
        let inserted = db::seed_sample_movies(&pool).await?;
        if inserted > 0 {
            tracing::info!(inserted, "Seeded sample movies");
        }
    }

    let limiter = RateLimiter::new(config.rate_limit_per_minute);

    Ok(AppState::new(
        pool,
        limiter,
        db::database_name(&config.database_url),
    ))
}

/// Build the HTTP router.
///
/// # Routes
///
/// - `POST /portal/keys` - open, not rate limited
/// - `/v1/*` - rate limited; movie writes additionally require an API key
pub fn router(state: AppState) -> Router {
    // Write routes: API key required
    let protected_routes = Router::new()
        .route("/movies", post(handlers::movies::create_movie))
        .route(
            "/movies/{id}",
            put(handlers::movies::update_movie).delete(handlers::movies::delete_movie),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.pool.clone(),
            middleware::auth::auth_middleware,
        ));

    let v1_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/movies", get(handlers::movies::list_movies))
        .route("/movies/{id}", get(handlers::movies::get_movie))
        .merge(protected_routes)
        // Unknown /v1 paths still count against the caller's quota
        .fallback(handlers::not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.limiter.clone(),
            middleware::rate_limit::rate_limit_middleware,
        ));

    Router::new()
        .route("/portal/keys", post(handlers::portal::issue_key))
        .nest("/v1", v1_routes)
        .fallback(handlers::not_found)
        // Panicking handlers become the standard 500 body
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
