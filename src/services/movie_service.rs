//! Movie service - data access for the movie catalog.
//!
//! Every mutation is a single SQL statement, so concurrent writers to the
//! same movie get SQLite's statement atomicity and last-write-wins.
//! Rows are converted through `Movie::from`, which decodes genres.

use chrono::Utc;
use rand::{Rng, distr::Alphanumeric};
use sqlx::{QueryBuilder, Sqlite};

use crate::{
    db::DbPool,
    error::AppError,
    models::movie::{Movie, MovieFilter, MoviePatch, MovieRecord, NewMovie, encode_genres},
};

const MOVIE_COLUMNS: &str = "id, title, year, rating, genres, plot, created_at";

const ID_PREFIX: &str = "mv_";
const ID_RANDOM_LEN: usize = 12;

/// List movies matching `filter`.
///
/// # Ordering
///
/// Rating descending, then year descending, then title ascending.
pub async fn list_movies(pool: &DbPool, filter: &MovieFilter) -> Result<Vec<Movie>, AppError> {
    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE 1 = 1"));

    if let Some(ref q) = filter.q {
        let pattern = format!("%{}%", escape_like(&q.to_lowercase()));
        query
            .push(" AND (lower(title) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR lower(plot) LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }

    if let Some(year) = filter.year {
        query.push(" AND year = ").push_bind(year);
    }

    query
        .push(" ORDER BY rating DESC, year DESC, title ASC LIMIT ")
        .push_bind(filter.limit)
        .push(" OFFSET ")
        .push_bind(filter.offset);

    let records = query
        .build_query_as::<MovieRecord>()
        .fetch_all(pool)
        .await?;

    Ok(records.into_iter().map(Movie::from).collect())
}

/// Get a movie by ID.
pub async fn get_movie(pool: &DbPool, id: &str) -> Result<Option<Movie>, AppError> {
    let record = sqlx::query_as::<_, MovieRecord>(&format!(
        "SELECT {MOVIE_COLUMNS} FROM movies WHERE id = ? LIMIT 1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(record.map(Movie::from))
}

/// Insert a new movie with a server generated ID.
pub async fn create_movie(pool: &DbPool, movie: NewMovie) -> Result<Movie, AppError> {
    let record = sqlx::query_as::<_, MovieRecord>(&format!(
        "INSERT INTO movies (id, title, year, rating, genres, plot, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)
         RETURNING {MOVIE_COLUMNS}"
    ))
    .bind(generate_movie_id())
    .bind(&movie.title)
    .bind(movie.year)
    .bind(movie.rating)
    .bind(encode_genres(&movie.genres))
    .bind(&movie.plot)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(record.into())
}

/// Overwrite the supplied fields of a movie, keeping the rest.
///
/// Returns `None` if no movie has this ID.
pub async fn update_movie(
    pool: &DbPool,
    id: &str,
    patch: MoviePatch,
) -> Result<Option<Movie>, AppError> {
    let record = sqlx::query_as::<_, MovieRecord>(&format!(
        "UPDATE movies SET
            title = COALESCE(?, title),
            year = COALESCE(?, year),
            rating = COALESCE(?, rating),
            genres = COALESCE(?, genres),
            plot = COALESCE(?, plot)
         WHERE id = ?
         RETURNING {MOVIE_COLUMNS}"
    ))
    .bind(patch.title)
    .bind(patch.year)
    .bind(patch.rating)
    .bind(patch.genres.as_deref().map(encode_genres))
    .bind(patch.plot)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(record.map(Movie::from))
}

/// Delete a movie. Returns `false` if no movie has this ID.
pub async fn delete_movie(pool: &DbPool, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM movies WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

fn generate_movie_id() -> String {
    let random: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(ID_RANDOM_LEN)
        .map(char::from)
        .collect();
    format!("{ID_PREFIX}{random}")
}

/// Escape LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn seeded_pool() -> DbPool {
        let pool = db::create_pool("sqlite::memory:").await.unwrap();
        db::run_migrations(&pool).await.unwrap();
        db::seed_sample_movies(&pool).await.unwrap();
        pool
    }

    fn new_movie(title: &str, year: i64, rating: f64) -> NewMovie {
        NewMovie {
            title: title.to_string(),
            year,
            rating,
            genres: vec!["Action".to_string(), "Sci-Fi".to_string()],
            plot: "Test plot".to_string(),
        }
    }

    #[test]
    fn escape_like_escapes_wildcards() {
        assert_eq!(escape_like("100%_done\\"), "100\\%\\_done\\\\");
        assert_eq!(escape_like("dark"), "dark");
    }

    #[tokio::test]
    async fn list_orders_by_rating_then_year_then_title() {
        let pool = seeded_pool().await;
        let movies = list_movies(&pool, &MovieFilter::default()).await.unwrap();

        let titles: Vec<&str> = movies.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "The Godfather",
                "The Dark Knight",
                "Inception",
                "Interstellar",
                "The Matrix",
                "Spirited Away",
                "Parasite",
                "Whiplash",
            ]
        );
    }

    #[tokio::test]
    async fn list_filters_by_text_case_insensitively() {
        let pool = seeded_pool().await;
        let filter = MovieFilter {
            q: Some("DARK".to_string()),
            ..Default::default()
        };

        let movies = list_movies(&pool, &filter).await.unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].id, "mv_darkknight");

        let filter = MovieFilter {
            q: Some("wormhole".to_string()),
            ..Default::default()
        };
        let movies = list_movies(&pool, &filter).await.unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].id, "mv_interstellar");
    }

    #[tokio::test]
    async fn list_treats_wildcards_literally() {
        let pool = seeded_pool().await;
        let filter = MovieFilter {
            q: Some("%".to_string()),
            ..Default::default()
        };

        assert!(list_movies(&pool, &filter).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_paginates() {
        let pool = seeded_pool().await;
        let filter = MovieFilter {
            limit: 2,
            offset: 1,
            ..Default::default()
        };

        let movies = list_movies(&pool, &filter).await.unwrap();
        let ids: Vec<&str> = movies.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["mv_darkknight", "mv_inception"]);
    }

    #[tokio::test]
    async fn create_then_get_round_trips_genres() {
        let pool = seeded_pool().await;
        let created = create_movie(&pool, new_movie("Arrival", 2016, 7.9))
            .await
            .unwrap();
        assert!(created.id.starts_with(ID_PREFIX));

        let fetched = get_movie(&pool, &created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.genres, vec!["Action", "Sci-Fi"]);
    }

    #[tokio::test]
    async fn reads_tolerate_badly_encoded_genres() {
        let pool = seeded_pool().await;
        sqlx::query("UPDATE movies SET genres = ? WHERE id = 'mv_matrix'")
            .bind(r#""[\"Action\",\"Sci-Fi\"]""#)
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("UPDATE movies SET genres = 'Drama, Music' WHERE id = 'mv_whiplash'")
            .execute(&pool)
            .await
            .unwrap();

        let matrix = get_movie(&pool, "mv_matrix").await.unwrap().unwrap();
        assert_eq!(matrix.genres, vec!["Action", "Sci-Fi"]);

        let whiplash = get_movie(&pool, "mv_whiplash").await.unwrap().unwrap();
        assert!(whiplash.genres.is_empty());
    }

    #[tokio::test]
    async fn update_only_overwrites_supplied_fields() {
        let pool = seeded_pool().await;
        let before = get_movie(&pool, "mv_inception").await.unwrap().unwrap();

        let patch = MoviePatch {
            rating: Some(9.5),
            ..Default::default()
        };
        let after = update_movie(&pool, "mv_inception", patch)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(after.rating, 9.5);
        assert_eq!(after.title, before.title);
        assert_eq!(after.year, before.year);
        assert_eq!(after.genres, before.genres);
        assert_eq!(after.plot, before.plot);
        assert_eq!(after.created_at, before.created_at);
    }

    #[tokio::test]
    async fn update_missing_movie_returns_none() {
        let pool = seeded_pool().await;
        let patch = MoviePatch {
            title: Some("Nope".to_string()),
            ..Default::default()
        };

        assert!(update_movie(&pool, "mv_missing", patch).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_was_removed() {
        let pool = seeded_pool().await;

        assert!(delete_movie(&pool, "mv_parasite").await.unwrap());
        assert!(get_movie(&pool, "mv_parasite").await.unwrap().is_none());
        assert!(!delete_movie(&pool, "mv_parasite").await.unwrap());
    }
}
