//! Catalog store client (spec §4.1).
//!
//! The catalog lives in Supabase, which is Postgres underneath, so this
//! is a thin `sqlx::PgPool` wrapper rather than a bespoke REST client,
//! one crate per upstream store, built around a relational join since
//! the entities here (`movies ⋈ movie_localizations ⋈ movie_genres`)
//! are genuinely relational.

use sg_config::{resolve_content_type, resolve_genre, resolve_platform};
use sg_models::{Filter, Movie};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::{debug, warn};

use crate::error::{CatalogError, CatalogResult};

/// A connection to the catalog store.
#[derive(Clone)]
pub struct CatalogClient {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct MovieRow {
    id: i64,
    title: String,
    year: i32,
    genres: Vec<String>,
    platform: String,
    imdb_score: f64,
    imdb_votes: i64,
    poster_url: String,
    trailer_url: Option<String>,
    runtime_minutes: Option<i32>,
}

impl From<MovieRow> for Movie {
    fn from(row: MovieRow) -> Self {
        Movie {
            id: row.id,
            title: row.title,
            year: row.year,
            genres: row.genres,
            platform: row.platform,
            imdb_score: row.imdb_score,
            imdb_votes: row.imdb_votes,
            poster_url: row.poster_url,
            trailer_url: row.trailer_url,
            runtime_minutes: row.runtime_minutes,
        }
    }
}

impl CatalogClient {
    /// Connect using `SUPABASE_URL` / `SUPABASE_KEY` from the environment
    /// (spec §6 required env vars). `SUPABASE_URL` is expected to already
    /// be a `postgres://` connection string (Supabase exposes one
    /// alongside its REST API); `SUPABASE_KEY` is appended as the
    /// password component when the URL doesn't already carry one.
    pub async fn from_env() -> CatalogResult<Self> {
        let url = std::env::var("SUPABASE_URL")
            .map_err(|_| CatalogError::unavailable("SUPABASE_URL not set"))?;
        let key = std::env::var("SUPABASE_KEY")
            .map_err(|_| CatalogError::unavailable("SUPABASE_KEY not set"))?;
        Self::connect(&url, &key).await
    }

    pub async fn connect(url: &str, key: &str) -> CatalogResult<Self> {
        let dsn = if url.contains('@') {
            url.to_string()
        } else {
            // Inject the service-role key as the password component.
            url.replacen("postgres://", &format!("postgres://postgres:{key}@"), 1)
        };

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&dsn)
            .await
            .map_err(CatalogError::Sqlx)?;

        Ok(Self { pool })
    }

    #[cfg(test)]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Return exactly `filter.num_movies` titles matching the filter,
    /// ranked by `imdb_score DESC, imdb_votes DESC` (spec §4.1). Never
    /// returns a partial result: fewer matching rows is `CatalogEmpty`.
    pub async fn extract(&self, filter: &Filter) -> CatalogResult<Vec<Movie>> {
        let genre = resolve_genre(&filter.genre)
            .ok_or_else(|| CatalogError::unavailable(format!("unknown genre: {}", filter.genre)))?;
        let platform = resolve_platform(&filter.platform).ok_or_else(|| {
            CatalogError::unavailable(format!("unknown platform: {}", filter.platform))
        })?;
        let content_type = resolve_content_type(&filter.content_type).ok_or_else(|| {
            CatalogError::unavailable(format!("unknown content_type: {}", filter.content_type))
        })?;

        debug!(
            country = %filter.country,
            platform,
            genre,
            content_type,
            limit = filter.num_movies,
            "querying catalog store"
        );

        let rows: Vec<MovieRow> = sqlx::query_as(
            r#"
            SELECT m.id, m.title, m.year, m.genres, m.platform,
                   m.imdb_score, m.imdb_votes, m.poster_url,
                   m.trailer_url, m.runtime_minutes
            FROM movies m
            JOIN movie_localizations l ON l.movie_id = m.id
            JOIN movie_genres g ON g.movie_id = m.id
            WHERE l.country_code = $1
              AND m.platform = $2
              AND g.genre = $3
              AND m.content_type = $4
            ORDER BY m.imdb_score DESC, m.imdb_votes DESC
            LIMIT $5
            "#,
        )
        .bind(&filter.country)
        .bind(platform)
        .bind(genre)
        .bind(content_type)
        .bind(filter.num_movies as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!("catalog query failed: {e}");
            CatalogError::Sqlx(e)
        })?;

        if rows.len() < filter.num_movies as usize {
            return Err(CatalogError::Empty {
                wanted: filter.num_movies,
                found: rows.len(),
            });
        }

        Ok(rows.into_iter().map(Movie::from).collect())
    }
}
