//! The job's immutable input selection.

use serde::{Deserialize, Serialize};

/// The 5-tuple that defines a job's catalog selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// ISO-alpha-2 country code, passed through verbatim.
    pub country: String,
    pub platform: String,
    pub genre: String,
    pub content_type: String,
    /// Number of movies to select. Must be >= 1.
    pub num_movies: u32,
}

impl Filter {
    pub fn new(
        country: impl Into<String>,
        platform: impl Into<String>,
        genre: impl Into<String>,
        content_type: impl Into<String>,
        num_movies: u32,
    ) -> Self {
        Self {
            country: country.into(),
            platform: platform.into(),
            genre: genre.into(),
            content_type: content_type.into(),
            num_movies,
        }
    }
}
