//! Scoped per-job temp-directory cleanup handle (spec §5: "the orchestrator
//! guarantees deletion on all exit paths via a scoped cleanup handle
//! registered at job start"). Teacher's `process_video` removes its
//! `work_dir` only at the end of the happy path; this guard generalizes
//! that to a `Drop` impl so cancellation and error exits clean up too.

use std::path::{Path, PathBuf};

use tracing::warn;

/// Owns a per-job scratch directory under `{root}/{workflow_id}` and
/// removes it (recursively, best-effort) when dropped.
pub struct JobTempDir {
    path: PathBuf,
}

impl JobTempDir {
    pub async fn create(root: impl AsRef<Path>, workflow_id: &str) -> std::io::Result<Self> {
        let path = root.as_ref().join(workflow_id);
        tokio::fs::create_dir_all(&path).await?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for JobTempDir {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("failed to clean up job temp dir {}: {e}", self.path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn directory_is_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let path = {
            let guard = JobTempDir::create(root.path(), "wf-1").await.unwrap();
            let p = guard.path().to_path_buf();
            assert!(p.exists());
            p
        };
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn cleanup_runs_even_when_job_errors_out() {
        let root = tempfile::tempdir().unwrap();
        let path;
        {
            let guard = JobTempDir::create(root.path(), "wf-2").await.unwrap();
            path = guard.path().to_path_buf();
            let result: Result<(), &str> = Err("simulated step failure");
            assert!(result.is_err());
        }
        assert!(!path.exists());
    }
}
