//! Optional dev-mode step-output cache (spec §2 "Job-result cache", §9
//! "Environment modes"). Serializes each step's output to disk keyed by
//! `(workflow_id, step)`, gated on the job's `AppEnv`, as plain JSON files
//! under `cache/{workflow_id}/{step}.json`, matching original
//! `utils/test_data_cache.py`'s on-disk layout.
//!
//! The orchestrator treats this as an optional observer, never a
//! dependency (spec §9): every method degrades to a no-op/`None` rather
//! than surfacing an error that could fail a job.

pub mod error;

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use sg_models::{job::AppEnv, WorkflowId};

pub use error::{CacheError, CacheResult};

/// Reads/writes per-step JSON blobs under `cache/{workflow_id}/{step}.json`,
/// gated by `AppEnv` (spec §9): `local` reads and writes, `dev` writes
/// only, `prod` does neither.
#[derive(Debug, Clone)]
pub struct StepCache {
    root: PathBuf,
    env: AppEnv,
}

impl StepCache {
    pub fn new(root: impl Into<PathBuf>, env: AppEnv) -> Self {
        Self {
            root: root.into(),
            env,
        }
    }

    fn path_for(&self, workflow_id: &WorkflowId, step: &str) -> PathBuf {
        self.root.join(workflow_id.as_str()).join(format!("{step}.json"))
    }

    /// Read a cached step output, if `AppEnv` allows reads and the file
    /// exists and deserializes cleanly. Any failure is logged and treated
    /// as a cache miss rather than propagated.
    pub async fn read<T: DeserializeOwned>(&self, workflow_id: &WorkflowId, step: &str) -> Option<T> {
        if !self.env.allows_cache_read() {
            return None;
        }
        let path = self.path_for(workflow_id, step);
        match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(value) => {
                    debug!("cache hit for {step} at {}", path.display());
                    Some(value)
                }
                Err(e) => {
                    warn!("cache entry at {} failed to deserialize: {e}", path.display());
                    None
                }
            },
            Err(_) => None,
        }
    }

    /// Write a step output if `AppEnv` allows writes. Failures are logged,
    /// not returned, matching the optional-observer contract — callers
    /// that want to know may still inspect the `Result`.
    pub async fn write<T: Serialize>(&self, workflow_id: &WorkflowId, step: &str, value: &T) -> CacheResult<()> {
        if !self.env.allows_cache_write() {
            return Ok(());
        }
        let path = self.path_for(workflow_id, step);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(value)?;
        tokio::fs::write(&path, bytes).await?;
        debug!("cached {step} at {}", path.display());
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        value: u32,
    }

    #[tokio::test]
    async fn local_mode_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let cache = StepCache::new(dir.path(), AppEnv::Local);
        let workflow_id = WorkflowId::from("wf-1".to_string());
        cache.write(&workflow_id, "catalog", &Sample { value: 7 }).await.unwrap();

        let loaded: Option<Sample> = cache.read(&workflow_id, "catalog").await;
        assert_eq!(loaded, Some(Sample { value: 7 }));
    }

    #[tokio::test]
    async fn prod_mode_never_reads_or_writes() {
        let dir = tempfile::tempdir().unwrap();
        let cache = StepCache::new(dir.path(), AppEnv::Prod);
        let workflow_id = WorkflowId::from("wf-2".to_string());
        cache.write(&workflow_id, "catalog", &Sample { value: 7 }).await.unwrap();

        assert!(!dir.path().join("wf-2").exists());
        let loaded: Option<Sample> = cache.read(&workflow_id, "catalog").await;
        assert_eq!(loaded, None);
    }

    #[tokio::test]
    async fn dev_mode_writes_but_never_reads() {
        let dir = tempfile::tempdir().unwrap();
        let cache = StepCache::new(dir.path(), AppEnv::Dev);
        let workflow_id = WorkflowId::from("wf-3".to_string());
        cache.write(&workflow_id, "script", &Sample { value: 3 }).await.unwrap();

        assert!(dir.path().join("wf-3").join("script.json").exists());
        let loaded: Option<Sample> = cache.read(&workflow_id, "script").await;
        assert_eq!(loaded, None);
    }

    #[tokio::test]
    async fn missing_entry_is_a_clean_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = StepCache::new(dir.path(), AppEnv::Local);
        let workflow_id = WorkflowId::from("wf-4".to_string());
        let loaded: Option<Sample> = cache.read(&workflow_id, "nonexistent").await;
        assert_eq!(loaded, None);
    }
}
