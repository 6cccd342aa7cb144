//! Catalog extraction errors (spec §4.1 / §7).

use thiserror::Error;

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog has fewer than {wanted} rows for the filter, found {found}")]
    Empty { wanted: u32, found: usize },

    #[error("catalog store unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

impl CatalogError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}
