//! Catalog extractor: step 1 of the StreamGank pipeline (spec §4.1).
//!
//! Given a `Filter`, returns exactly `filter.num_movies` `Movie` records
//! ranked by popularity, or fails with `CatalogEmpty`/`CatalogUnavailable`.
//! Never returns a partial result.

pub mod client;
pub mod error;

pub use client::CatalogClient;
pub use error::{CatalogError, CatalogResult};

#[cfg(test)]
mod tests {
    use super::*;
    use sg_models::Filter;

    #[test]
    fn unknown_genre_is_rejected_before_any_query() {
        // Constructing the filter itself never fails; resolution happens
        // inside `extract`, exercised against a live pool in the
        // integration tests (tests/integration/catalog_tests.rs).
        let filter = Filter::new("US", "Netflix", "Not A Genre", "Film", 3);
        assert_eq!(filter.genre, "Not A Genre");
    }
}
