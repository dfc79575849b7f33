//! Movie data models and API request/response types.
//!
//! This module defines:
//! - `MovieRecord`: Database entity representing a movie row
//! - `Movie`: Response body returned to clients
//! - `CreateMovieRequest` / `UpdateMovieRequest`: Request bodies for writes
//! - `ListMoviesQuery`: Query string accepted by the list endpoint
//!
//! # Genre Storage
//!
//! Genres are persisted as JSON text. Rows may have been written under an
//! older or inconsistent convention (double-encoded strings, non-string
//! elements, plain garbage), so every read goes through [`decode_genres`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;

/// Default page size for `GET /v1/movies`.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Represents a movie record from the database.
///
/// # Database Table
///
/// Maps to the `movies` table. `genres` is the raw JSON text as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MovieRecord {
    /// Server generated identifier (`mv_` prefix), never changes
    pub id: String,

    pub title: String,

    pub year: i64,

    pub rating: f64,

    /// JSON-encoded list of genre labels
    pub genres: String,

    pub plot: String,

    pub created_at: DateTime<Utc>,
}

/// Response body for movie endpoints.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": "mv_inception",
///   "title": "Inception",
///   "year": 2010,
///   "rating": 8.8,
///   "genres": ["Action", "Sci-Fi"],
///   "plot": "A thief enters dreams to steal secrets...",
///   "createdAt": "2025-12-20T10:00:00Z"
/// }
/// ```
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: String,
    pub title: String,
    pub year: i64,
    pub rating: f64,
    pub genres: Vec<String>,
    pub plot: String,
    pub created_at: DateTime<Utc>,
}

/// Convert a database row into the API shape, decoding genres on the way.
impl From<MovieRecord> for Movie {
    fn from(record: MovieRecord) -> Self {
        Self {
            genres: decode_genres(&record.genres),
            id: record.id,
            title: record.title,
            year: record.year,
            rating: record.rating,
            plot: record.plot,
            created_at: record.created_at,
        }
    }
}

/// Decode the stored genre text into a list of labels.
///
/// Unparseable text decodes to an empty list.
pub fn decode_genres(raw: &str) -> Vec<String> {
    serde_json::from_str::<Value>(raw)
        .map(normalize_genres)
        .unwrap_or_default()
}

/// Normalize an arbitrary JSON value into a list of genre labels.
///
/// - An array keeps its string elements, in order; other elements are dropped.
/// - A string is treated as JSON text and decoded once more (double encoding).
/// - Anything else yields an empty list.
pub fn normalize_genres(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(label) => Some(label),
                _ => None,
            })
            .collect(),
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Array(items)) => normalize_genres(Value::Array(items)),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Encode genres for storage.
pub fn encode_genres(genres: &[String]) -> String {
    serde_json::to_string(genres).unwrap_or_else(|_| "[]".to_string())
}

/// A number supplied either as a JSON number or as numeric text (`2010`, `"2010"`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Number(f64),
    Text(String),
}

impl NumericInput {
    /// The finite numeric value, if there is one.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            NumericInput::Number(n) => *n,
            NumericInput::Text(text) => text.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    /// The value as a whole number; fractional values are rejected.
    pub fn as_i64(&self) -> Option<i64> {
        let value = self.as_f64()?;
        if value.fract() != 0.0 || value.abs() > i64::MAX as f64 {
            return None;
        }
        Some(value as i64)
    }
}

/// Validated fields for a new movie.
#[derive(Debug, Clone)]
pub struct NewMovie {
    pub title: String,
    pub year: i64,
    pub rating: f64,
    pub genres: Vec<String>,
    pub plot: String,
}

/// Request body for `POST /v1/movies`.
///
/// # JSON Example
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
/// # Validation
///
/// - `title`: Required, non-empty
/// - `year`: Required, non-zero whole number (numeric strings accepted)
/// - `rating`: Optional, defaults to 0
/// - `genres`: Optional, defaults to `[]`; non-array values become `[]`
/// - `plot`: Optional, defaults to `""`
#[derive(Debug, Default, Deserialize)]
pub struct CreateMovieRequest {
    pub title: Option<String>,
    pub year: Option<NumericInput>,
    pub rating: Option<NumericInput>,
    pub genres: Option<Value>,
    pub plot: Option<String>,
}

impl CreateMovieRequest {
    pub fn validate(self) -> Result<NewMovie, AppError> {
        let title = self
            .title
            .filter(|title| !title.is_empty())
            .ok_or_else(|| AppError::InvalidRequest("title and year are required".to_string()))?;

        let year = match self.year {
            None => {
                return Err(AppError::InvalidRequest(
                    "title and year are required".to_string(),
                ));
            }
            Some(year) => parse_year(&year)?,
        };
        if year == 0 {
            return Err(AppError::InvalidRequest(
                "title and year are required".to_string(),
            ));
        }

        let rating = self.rating.as_ref().map(parse_rating).transpose()?;

        Ok(NewMovie {
            title,
            year,
            rating: rating.unwrap_or(0.0),
            genres: self.genres.map(normalize_genres).unwrap_or_default(),
            plot: self.plot.unwrap_or_default(),
        })
    }
}

/// Fields to overwrite on an existing movie; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct MoviePatch {
    pub title: Option<String>,
    pub year: Option<i64>,
    pub rating: Option<f64>,
    pub genres: Option<Vec<String>>,
    pub plot: Option<String>,
}

/// Request body for `PUT /v1/movies/{id}`. Every field is optional.
///
/// Absent and `null` fields leave the stored value untouched.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateMovieRequest {
    pub title: Option<String>,
    pub year: Option<NumericInput>,
    pub rating: Option<NumericInput>,
    pub genres: Option<Value>,
    pub plot: Option<String>,
}

impl UpdateMovieRequest {
    pub fn validate(self) -> Result<MoviePatch, AppError> {
        Ok(MoviePatch {
            title: self.title,
            year: self.year.as_ref().map(parse_year).transpose()?,
            rating: self.rating.as_ref().map(parse_rating).transpose()?,
            genres: self.genres.map(normalize_genres),
            plot: self.plot,
        })
    }
}

fn parse_year(input: &NumericInput) -> Result<i64, AppError> {
    input
        .as_i64()
        .ok_or_else(|| AppError::InvalidRequest("year must be a whole number".to_string()))
}

fn parse_rating(input: &NumericInput) -> Result<f64, AppError> {
    input
        .as_f64()
        .ok_or_else(|| AppError::InvalidRequest("rating must be a number".to_string()))
}

/// Query string for `GET /v1/movies`.
///
/// Values arrive as text so that malformed numbers produce a 400 from the
/// handler; empty values are treated as absent.
#[derive(Debug, Default, Deserialize)]
pub struct ListMoviesQuery {
    pub q: Option<String>,
    pub year: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// Validated list filter handed to the movie service.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieFilter {
    /// Case-insensitive substring matched against title and plot
    pub q: Option<String>,
    pub year: Option<i64>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for MovieFilter {
    fn default() -> Self {
        Self {
            q: None,
            year: None,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl ListMoviesQuery {
    pub fn into_filter(self) -> Result<MovieFilter, AppError> {
        let q = non_empty(self.q);
        let year = non_empty(self.year)
            .map(|year| parse_query_number(&year, "year"))
            .transpose()?;
        let limit = non_empty(self.limit)
            .map(|limit| parse_query_number(&limit, "limit"))
            .transpose()?
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(0, MAX_PAGE_SIZE);
        let offset = non_empty(self.offset)
            .map(|offset| parse_query_number(&offset, "offset"))
            .transpose()?
            .unwrap_or(0)
            .max(0);

        Ok(MovieFilter {
            q,
            year,
            limit,
            offset,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_query_number(value: &str, field: &str) -> Result<i64, AppError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| AppError::InvalidRequest(format!("{field} must be a whole number")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_well_formed_genre_text() {
        assert_eq!(decode_genres(r#"["Action","Sci-Fi"]"#), vec!["Action", "Sci-Fi"]);
        assert!(decode_genres("[]").is_empty());
    }

    #[test]
    fn decodes_double_encoded_genre_text() {
        let stored = serde_json::to_string(r#"["Drama","Music"]"#).unwrap();
        assert_eq!(decode_genres(&stored), vec!["Drama", "Music"]);
    }

    #[test]
    fn garbage_genre_text_decodes_to_empty() {
        assert!(decode_genres("Action, Sci-Fi").is_empty());
        assert!(decode_genres("").is_empty());
        assert!(decode_genres("42").is_empty());
        assert!(decode_genres(r#"{"genre":"Action"}"#).is_empty());
    }

    #[test]
    fn non_string_genre_elements_are_dropped() {
        assert_eq!(
            normalize_genres(json!(["Crime", 7, null, "Drama"])),
            vec!["Crime", "Drama"]
        );
    }

    #[test]
    fn numeric_input_accepts_numbers_and_numeric_text() {
        let number: NumericInput = serde_json::from_value(json!(2014)).unwrap();
        let text: NumericInput = serde_json::from_value(json!(" 2014 ")).unwrap();
        let fractional: NumericInput = serde_json::from_value(json!(8.5)).unwrap();
        let junk: NumericInput = serde_json::from_value(json!("soon")).unwrap();

        assert_eq!(number.as_i64(), Some(2014));
        assert_eq!(text.as_i64(), Some(2014));
        assert_eq!(fractional.as_i64(), None);
        assert_eq!(fractional.as_f64(), Some(8.5));
        assert_eq!(junk.as_f64(), None);
    }

    #[test]
    fn create_requires_title_and_year() {
        let missing_year: CreateMovieRequest =
            serde_json::from_value(json!({ "title": "Arrival" })).unwrap();
        assert!(matches!(
            missing_year.validate(),
            Err(AppError::InvalidRequest(_))
        ));

        let empty_title: CreateMovieRequest =
            serde_json::from_value(json!({ "title": "", "year": 2016 })).unwrap();
        assert!(matches!(
            empty_title.validate(),
            Err(AppError::InvalidRequest(_))
        ));
    }

    #[test]
    fn create_applies_defaults_and_coerces() {
        let request: CreateMovieRequest = serde_json::from_value(json!({
            "title": "Arrival",
            "year": "2016",
            "genres": "not-a-list"
        }))
        .unwrap();

        let movie = request.validate().unwrap();
        assert_eq!(movie.year, 2016);
        assert_eq!(movie.rating, 0.0);
        assert!(movie.genres.is_empty());
        assert_eq!(movie.plot, "");
    }

    #[test]
    fn update_keeps_absent_fields_unset() {
        let request: UpdateMovieRequest =
            serde_json::from_value(json!({ "rating": "9.1", "plot": null })).unwrap();
        let patch = request.validate().unwrap();

        assert_eq!(patch.rating, Some(9.1));
        assert!(patch.title.is_none());
        assert!(patch.year.is_none());
        assert!(patch.genres.is_none());
        assert!(patch.plot.is_none());
    }

    #[test]
    fn list_query_defaults_and_clamps() {
        let filter = ListMoviesQuery::default().into_filter().unwrap();
        assert_eq!(filter, MovieFilter::default());

        let filter = ListMoviesQuery {
            q: Some("  ".to_string()),
            year: Some("2014".to_string()),
            limit: Some("1000".to_string()),
            offset: Some("-5".to_string()),
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter.q, None);
        assert_eq!(filter.year, Some(2014));
        assert_eq!(filter.limit, MAX_PAGE_SIZE);
        assert_eq!(filter.offset, 0);
    }

    #[test]
    fn list_query_rejects_non_numeric_year() {
        let query = ListMoviesQuery {
            year: Some("recent".to_string()),
            ..Default::default()
        };
        assert!(matches!(query.into_filter(), Err(AppError::InvalidRequest(_))));
    }
}
