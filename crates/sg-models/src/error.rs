//! Error kinds surfaced via a job's terminal status (spec §7).

use serde::{Deserialize, Serialize};

/// The step at which an error occurred, also used for progress events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    ConfigValidation,
    CatalogExtraction,
    ScriptGeneration,
    AssetPreparation,
    AvatarRendering,
    UrlResolution,
    Composition,
    RenderHandoff,
}

impl StepName {
    /// 0..8 step number used in `ProgressEvent` (0 = workflow_started,
    /// 8 = workflow_completed), per spec §6.
    pub fn step_number(self) -> u8 {
        match self {
            Self::ConfigValidation => 0,
            Self::CatalogExtraction => 1,
            Self::ScriptGeneration => 2,
            Self::AssetPreparation => 3,
            Self::AvatarRendering => 4,
            Self::UrlResolution => 5,
            Self::Composition => 6,
            Self::RenderHandoff => 7,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::ConfigValidation => "Configuration Validation",
            Self::CatalogExtraction => "Catalog Extraction",
            Self::ScriptGeneration => "Script Generation",
            Self::AssetPreparation => "Asset Preparation",
            Self::AvatarRendering => "Avatar Video Rendering",
            Self::UrlResolution => "Script-Video URL Resolution",
            Self::Composition => "Composition",
            Self::RenderHandoff => "Render Handoff",
        }
    }
}

/// The set of error kinds a job can terminate with (spec §7).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "message")]
pub enum ErrorKind {
    ConfigInvalid(String),
    CatalogEmpty(String),
    CatalogUnavailable(String),
    ScriptGenerationFailed(String),
    HookTimingUnmet(String),
    AssetGenerationFailed(String),
    ScrollVideoUnavailable(String),
    AvatarRenderFailed(String),
    AvatarUrlInvalid(String),
    CompositionSubmissionFailed(String),
}

impl ErrorKind {
    /// Non-fatal kinds let the job continue to `completed` (spec §7).
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ErrorKind::HookTimingUnmet(_) | ErrorKind::ScrollVideoUnavailable(_)
        )
    }

    pub fn message(&self) -> &str {
        match self {
            ErrorKind::ConfigInvalid(m)
            | ErrorKind::CatalogEmpty(m)
            | ErrorKind::CatalogUnavailable(m)
            | ErrorKind::ScriptGenerationFailed(m)
            | ErrorKind::HookTimingUnmet(m)
            | ErrorKind::AssetGenerationFailed(m)
            | ErrorKind::ScrollVideoUnavailable(m)
            | ErrorKind::AvatarRenderFailed(m)
            | ErrorKind::AvatarUrlInvalid(m)
            | ErrorKind::CompositionSubmissionFailed(m) => m,
        }
    }
}

/// A recorded error, fatal or not, attached to `JobRecord.errors`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub kind: ErrorKind,
    pub step: StepName,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub at: chrono::DateTime<chrono::Utc>,
}

impl ErrorEntry {
    pub fn new(kind: ErrorKind, step: StepName) -> Self {
        Self {
            kind,
            step,
            at: chrono::Utc::now(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_fatal_kinds_are_exactly_two() {
        assert!(!ErrorKind::HookTimingUnmet("x".into()).is_fatal());
        assert!(!ErrorKind::ScrollVideoUnavailable("x".into()).is_fatal());
        assert!(ErrorKind::CatalogEmpty("x".into()).is_fatal());
        assert!(ErrorKind::AvatarRenderFailed("x".into()).is_fatal());
    }

    #[test]
    fn step_numbers_are_sequential() {
        assert_eq!(StepName::CatalogExtraction.step_number(), 1);
        assert_eq!(StepName::RenderHandoff.step_number(), 7);
    }
}
