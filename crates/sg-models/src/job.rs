//! The orchestrator's mutable job record.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::asset::AssetBundle;
use crate::avatar::AvatarJob;
use crate::error::ErrorEntry;
use crate::filter::Filter;
use crate::ids::{JobId, WorkflowId};
use crate::movie::Movie;
use crate::script::ScriptBundle;

/// Terminal / in-flight status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

/// The single mutable record owned by the orchestrator for a job's
/// duration. Each step reads preceding fields, writes its own, and
/// returns; no background task mutates it outside step boundaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: JobId,
    pub workflow_id: WorkflowId,
    pub filter: Filter,
    pub movies: Option<Vec<Movie>>,
    pub scripts: Option<ScriptBundle>,
    pub assets: Option<AssetBundle>,
    pub avatar_jobs: Option<Vec<AvatarJob>>,
    pub avatar_urls: Option<BTreeMap<String, String>>,
    pub composition_id: Option<String>,
    pub step_timings: BTreeMap<String, f64>,
    pub errors: Vec<ErrorEntry>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub status: JobStatus,
}

impl JobRecord {
    pub fn new(filter: Filter) -> Self {
        Self {
            job_id: JobId::new(),
            workflow_id: WorkflowId::new(),
            filter,
            movies: None,
            scripts: None,
            assets: None,
            avatar_jobs: None,
            avatar_urls: None,
            composition_id: None,
            step_timings: BTreeMap::new(),
            errors: Vec::new(),
            started_at: chrono::Utc::now(),
            status: JobStatus::Running,
        }
    }

    pub fn record_timing(&mut self, step: &str, duration: Duration) {
        self.step_timings
            .insert(step.to_string(), duration.as_secs_f64());
    }

    pub fn record_error(&mut self, entry: ErrorEntry) {
        let fatal = entry.is_fatal();
        self.errors.push(entry);
        if fatal {
            self.status = JobStatus::Failed;
        }
    }

    pub fn has_fatal_error(&self) -> bool {
        self.errors.iter().any(ErrorEntry::is_fatal)
    }
}

/// Runtime environment mode controlling the optional dev-mode cache
/// (spec §9 "Environment modes").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AppEnv {
    /// Reads cached step outputs from disk (and writes them).
    Local,
    /// Saves outputs for later reuse; never reads.
    #[default]
    Dev,
    /// Neither reads nor writes the cache.
    Prod,
}

impl AppEnv {
    pub fn from_env_str(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "local" => Self::Local,
            "prod" | "production" => Self::Prod,
            _ => Self::Dev,
        }
    }

    pub fn allows_cache_read(self) -> bool {
        matches!(self, Self::Local)
    }

    pub fn allows_cache_write(self) -> bool {
        matches!(self, Self::Local | Self::Dev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_error_flips_status() {
        let mut job = JobRecord::new(Filter::new("US", "Netflix", "Horror", "Film", 3));
        assert_eq!(job.status, JobStatus::Running);
        job.record_error(ErrorEntry::new(
            crate::error::ErrorKind::CatalogEmpty("none found".into()),
            crate::error::StepName::CatalogExtraction,
        ));
        assert_eq!(job.status, JobStatus::Failed);
    }

    #[test]
    fn non_fatal_error_does_not_flip_status() {
        let mut job = JobRecord::new(Filter::new("US", "Netflix", "Horror", "Film", 3));
        job.record_error(ErrorEntry::new(
            crate::error::ErrorKind::ScrollVideoUnavailable("capture failed".into()),
            crate::error::StepName::AssetPreparation,
        ));
        assert_eq!(job.status, JobStatus::Running);
        assert!(!job.has_fatal_error());
    }

    #[test]
    fn env_modes_gate_cache_io() {
        assert!(AppEnv::Local.allows_cache_read());
        assert!(AppEnv::Local.allows_cache_write());
        assert!(!AppEnv::Dev.allows_cache_read());
        assert!(AppEnv::Dev.allows_cache_write());
        assert!(!AppEnv::Prod.allows_cache_read());
        assert!(!AppEnv::Prod.allows_cache_write());
    }
}
