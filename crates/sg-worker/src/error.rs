//! Top-level worker error, wrapping each collaborating crate's error via
//! `#[from]` (spec §7).

use thiserror::Error;

use sg_models::ErrorKind;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("configuration invalid: {0}")]
    ConfigInvalid(String),

    #[error("job cancelled")]
    Cancelled,

    #[error("catalog error: {0}")]
    Catalog(#[from] sg_catalog::CatalogError),

    #[error("script generation error: {0}")]
    Llm(#[from] sg_llm::LlmError),

    #[error("media error: {0}")]
    Media(#[from] sg_media::MediaError),

    #[error("external client error: {0}")]
    Client(#[from] sg_clients::ClientError),

    #[error("composition error: {0}")]
    Composition(#[from] sg_composition::CompositionError),

    #[error("progress subsystem error: {0}")]
    Progress(#[from] sg_progress::ProgressError),

    #[error("cache error: {0}")]
    Cache(#[from] sg_cache::CacheError),

    #[error("asset preparation failed: {0}")]
    AssetGenerationFailed(String),

    #[error("avatar rendering failed: {0}")]
    AvatarRenderFailed(String),

    #[error("avatar url invalid: {0}")]
    AvatarUrlInvalid(String),

    #[error("composition submission failed: {0}")]
    CompositionSubmissionFailed(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WorkerError {
    pub fn config_invalid(msg: impl Into<String>) -> Self {
        Self::ConfigInvalid(msg.into())
    }

    /// Map to the job-terminal `ErrorKind` recorded on `JobRecord.errors`
    /// (spec §7). `HookTimingUnmet` is produced directly by the script-
    /// generation step from `GenerationWarning`, not through this path,
    /// since it is non-fatal and never surfaces as a `WorkerError`.
    pub fn to_error_kind(&self) -> ErrorKind {
        match self {
            Self::ConfigInvalid(m) => ErrorKind::ConfigInvalid(m.clone()),
            Self::Cancelled => ErrorKind::ConfigInvalid("job cancelled".to_string()),
            Self::Catalog(e) => match e {
                sg_catalog::CatalogError::Empty { .. } => ErrorKind::CatalogEmpty(e.to_string()),
                _ => ErrorKind::CatalogUnavailable(e.to_string()),
            },
            Self::Llm(_) => ErrorKind::ScriptGenerationFailed(self.to_string()),
            Self::Media(_) => ErrorKind::AssetGenerationFailed(self.to_string()),
            Self::Client(_) => ErrorKind::AssetGenerationFailed(self.to_string()),
            Self::Composition(_) => ErrorKind::CompositionSubmissionFailed(self.to_string()),
            Self::Progress(_) | Self::Cache(_) | Self::Io(_) | Self::Json(_) => {
                ErrorKind::ConfigInvalid(self.to_string())
            }
            Self::AssetGenerationFailed(m) => ErrorKind::AssetGenerationFailed(m.clone()),
            Self::AvatarRenderFailed(m) => ErrorKind::AvatarRenderFailed(m.clone()),
            Self::AvatarUrlInvalid(m) => ErrorKind::AvatarUrlInvalid(m.clone()),
            Self::CompositionSubmissionFailed(m) => ErrorKind::CompositionSubmissionFailed(m.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_models::{ErrorEntry, StepName};

    #[test]
    fn config_invalid_maps_to_config_invalid_kind() {
        let err = WorkerError::config_invalid("unknown genre: Jazz");
        assert!(matches!(err.to_error_kind(), ErrorKind::ConfigInvalid(_)));
    }

    #[test]
    fn catalog_empty_maps_to_catalog_empty_kind() {
        let err = WorkerError::Catalog(sg_catalog::CatalogError::Empty { wanted: 3, found: 1 });
        assert!(matches!(err.to_error_kind(), ErrorKind::CatalogEmpty(_)));
    }

    #[test]
    fn avatar_render_failed_round_trips_its_message() {
        let err = WorkerError::AvatarRenderFailed("slot movie2 timed out".to_string());
        match err.to_error_kind() {
            ErrorKind::AvatarRenderFailed(m) => assert_eq!(m, "slot movie2 timed out"),
            other => panic!("expected AvatarRenderFailed, got {other:?}"),
        }
    }

    #[test]
    fn composition_submission_failed_is_fatal() {
        let err = WorkerError::CompositionSubmissionFailed("HTTP 400".to_string());
        let kind = err.to_error_kind();
        let entry = ErrorEntry::new(kind, StepName::RenderHandoff);
        assert!(entry.is_fatal());
    }
}
