//! Movie catalog HTTP handlers.
//!
//! This module implements the movie API endpoints:
//! - GET /v1/movies - List movies (public)
//! - GET /v1/movies/{id} - Get movie by ID (public)
//! - POST /v1/movies - Create movie (API key required)
//! - PUT /v1/movies/{id} - Partially update movie (API key required)
//! - DELETE /v1/movies/{id} - Delete movie (API key required)

use crate::{
    db::DbPool,
    error::AppError,
    handlers::json::JsonBody,
    middleware::auth::AuthContext,
    models::movie::{CreateMovieRequest, ListMoviesQuery, Movie, UpdateMovieRequest},
    services::{key_service, movie_service},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Serialize;
use serde_json::{Value, json};

/// Envelope used by every movie endpoint.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T> DataResponse<T> {
    fn new(data: T) -> Json<Self> {
        Json(Self { data })
    }
}

/// List movies.
///
/// # Query Parameters
///
/// - `q` - case-insensitive substring of title or plot
/// - `year` - exact release year
/// - `limit` - page size (default 50); values above 100 are capped at 100,
///   negative values return no rows
/// - `offset` - rows to skip (default 0, negative treated as 0)
///
/// Non-numeric `year`, `limit` or `offset` values are rejected with 400.
///
/// # Response (200 OK)
///
/// ```json
/// { "data": [ { "id": "mv_darkknight", "title": "The Dark Knight", ... } ] }
/// ```
pub async fn list_movies(
    State(pool): State<DbPool>,
    Query(query): Query<ListMoviesQuery>,
) -> Result<Json<DataResponse<Vec<Movie>>>, AppError> {
    let filter = query.into_filter()?;
    let movies = movie_service::list_movies(&pool, &filter).await?;

    Ok(DataResponse::new(movies))
}

/// Get a specific movie by ID.
///
/// # Response
///
/// - **Success (200 OK)**: `{ "data": movie }`
/// - **Error (404)**: No movie with this ID
pub async fn get_movie(
    State(pool): State<DbPool>,
    Path(movie_id): Path<String>,
) -> Result<Json<DataResponse<Movie>>, AppError> {
    let movie = movie_service::get_movie(&pool, &movie_id)
        .await?
        .ok_or(AppError::MovieNotFound)?;

    Ok(DataResponse::new(movie))
}

/// Create a movie.
///
/// # Request Body
///
/// ```json
/// {
///   "title": "Arrival",
///   "year": 2016,
///   "rating": 7.9,
///   "genres": ["Drama", "Sci-Fi"],
///   "plot": "A linguist works with the military to communicate with alien lifeforms."
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: `{ "data": movie }`
/// - **Error (400)**: `title` or `year` missing, a numeric field is not a number,
///   or the body is not valid JSON
pub async fn create_movie(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(request): JsonBody<CreateMovieRequest>,
) -> Result<(StatusCode, Json<DataResponse<Movie>>), AppError> {
    let new_movie = request.validate()?;
    let movie = movie_service::create_movie(&pool, new_movie).await?;

    tracing::info!(
        movie_id = %movie.id,
        key = %key_service::redact_key(&auth.api_key),
        "Movie created"
    );

    Ok((StatusCode::CREATED, DataResponse::new(movie)))
}

/// Update the supplied fields of a movie.
///
/// Fields left out of the body keep their stored values.
///
/// # Response
///
/// - **Success (200 OK)**: `{ "data": movie }` with the merged record
/// - **Error (400)**: a field has the wrong type, or the body is not valid JSON
/// - **Error (404)**: No movie with this ID
pub async fn update_movie(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(movie_id): Path<String>,
    JsonBody(request): JsonBody<UpdateMovieRequest>,
) -> Result<Json<DataResponse<Movie>>, AppError> {
    let patch = request.validate()?;
    let movie = movie_service::update_movie(&pool, &movie_id, patch)
        .await?
        .ok_or(AppError::MovieNotFound)?;

    tracing::info!(
        movie_id = %movie.id,
        key = %key_service::redact_key(&auth.api_key),
        "Movie updated"
    );

    Ok(DataResponse::new(movie))
}

/// Delete a movie.
///
/// # Response
///
/// - **Success (200 OK)**: `{ "ok": true }`
/// - **Error (404)**: No movie with this ID
pub async fn delete_movie(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(movie_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !movie_service::delete_movie(&pool, &movie_id).await? {
        return Err(AppError::MovieNotFound);
    }

    tracing::info!(
        movie_id = %movie_id,
        key = %key_service::redact_key(&auth.api_key),
        "Movie deleted"
    );

    Ok(Json(json!({ "ok": true })))
}
