//! Structured job logging: tracing spans plus leveled convenience methods
//! that also write through to the per-job JSONL file required by spec §6,
//! rather than only the process-wide tracing subscriber.

use serde_json::Value;
use tracing::Span;

use sg_models::JobId;
use sg_progress::WorkflowLogFile;

/// Job logger pairing the console/JSON tracing subscriber with the per-job
/// structured log file.
pub struct JobLogger<'a> {
    job_id: String,
    log_file: &'a WorkflowLogFile,
}

impl<'a> JobLogger<'a> {
    pub fn new(job_id: &JobId, log_file: &'a WorkflowLogFile) -> Self {
        Self {
            job_id: job_id.to_string(),
            log_file,
        }
    }

    pub fn log_start(&self, message: &str, details: Value) {
        tracing::info!(job_id = %self.job_id, "{message}");
        self.log_file.info(message, details).ok();
    }

    pub fn log_progress(&self, message: &str, details: Value) {
        tracing::info!(job_id = %self.job_id, "{message}");
        self.log_file.info(message, details).ok();
    }

    pub fn log_warning(&self, message: &str, details: Value) {
        tracing::warn!(job_id = %self.job_id, "{message}");
        self.log_file.warn(message, details).ok();
    }

    pub fn log_error(&self, message: &str, details: Value) {
        tracing::error!(job_id = %self.job_id, "{message}");
        self.log_file.error(message, details).ok();
    }

    pub fn log_completion(&self, message: &str, details: Value) {
        tracing::info!(job_id = %self.job_id, "{message}");
        self.log_file.info(message, details).ok();
    }

    pub fn create_span(&self, step: &str) -> Span {
        tracing::info_span!("step", job_id = %self.job_id, step = %step)
    }
}
