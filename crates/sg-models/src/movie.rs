//! Catalog title produced by step 1.

use serde::{Deserialize, Serialize};

/// A single catalog title, read-only after step 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub year: i32,
    pub genres: Vec<String>,
    pub platform: String,
    pub imdb_score: f64,
    pub imdb_votes: i64,
    pub poster_url: String,
    pub trailer_url: Option<String>,
    pub runtime_minutes: Option<i32>,
}

impl Movie {
    /// Slugified title safe for use in a public CDN id, e.g.
    /// `enhanced_posters/{safe_title}_{movie_id}`.
    pub fn safe_title(&self) -> String {
        self.title
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect::<String>()
            .to_lowercase()
    }

    /// `slot` name (`movie1`, `movie2`, ...) for a 1-indexed position.
    pub fn slot_name(index: usize) -> String {
        format!("movie{}", index + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Movie {
        Movie {
            id: 42,
            title: "The Conjuring: Last Rites!".to_string(),
            year: 2025,
            genres: vec!["Horror".to_string()],
            platform: "Netflix".to_string(),
            imdb_score: 7.7,
            imdb_votes: 12345,
            poster_url: "https://example.com/poster.jpg".to_string(),
            trailer_url: Some("https://example.com/trailer.mp4".to_string()),
            runtime_minutes: Some(103),
        }
    }

    #[test]
    fn safe_title_strips_punctuation() {
        let movie = sample();
        assert_eq!(movie.safe_title(), "the_conjuring__last_rites_");
    }

    #[test]
    fn slot_name_is_one_indexed() {
        assert_eq!(Movie::slot_name(0), "movie1");
        assert_eq!(Movie::slot_name(2), "movie3");
    }
}
