//! Per-job structured JSONL log sink (spec §6): one file per job rather
//! than only the process-wide tracing subscriber, matching the original
//! `utils/job_logger.py`'s one-file-per-job layout and line format.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use serde_json::Value;
use tracing::{error as trace_error, info as trace_info, warn as trace_warn};

use sg_models::WorkflowId;

use crate::error::ProgressResult;

const LOGGER_NAME: &str = "streamgank.workflow";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

/// Writes `logs/workflow_{workflow_id}.log` lines in the format
/// `YYYY-MM-DD HH:MM:SS - <logger> - <LEVEL> - <message> | STRUCTURED: <json>`.
///
/// Also mirrors every entry to the process-wide `tracing` subscriber, but
/// the file is the primary sink here and tracing the secondary one, per
/// spec §6's explicit file-path requirement.
pub struct WorkflowLogFile {
    path: PathBuf,
    file: Mutex<File>,
    workflow_id: WorkflowId,
}

impl WorkflowLogFile {
    /// Open (creating `log_dir` if needed) the log file for `workflow_id`.
    pub fn open(log_dir: impl AsRef<Path>, workflow_id: WorkflowId) -> ProgressResult<Self> {
        let log_dir = log_dir.as_ref();
        std::fs::create_dir_all(log_dir)?;
        let path = log_dir.join(format!("workflow_{workflow_id}.log"));

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            file: Mutex::new(file),
            workflow_id,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn log(&self, level: LogLevel, message: &str, details: Value) -> ProgressResult<()> {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S");
        let structured = serde_json::to_string(&details)?;
        let line = format!("{timestamp} - {LOGGER_NAME} - {} - {message} | STRUCTURED: {structured}\n", level.as_str());

        {
            let mut file = self.file.lock().expect("log file mutex poisoned");
            file.write_all(line.as_bytes())?;
            file.flush()?;
        }

        match level {
            LogLevel::Info => trace_info!(workflow_id = %self.workflow_id, %message),
            LogLevel::Warning => trace_warn!(workflow_id = %self.workflow_id, %message),
            LogLevel::Error => trace_error!(workflow_id = %self.workflow_id, %message),
        }

        Ok(())
    }

    pub fn info(&self, message: &str, details: Value) -> ProgressResult<()> {
        self.log(LogLevel::Info, message, details)
    }

    pub fn warn(&self, message: &str, details: Value) -> ProgressResult<()> {
        self.log(LogLevel::Warning, message, details)
    }

    pub fn error(&self, message: &str, details: Value) -> ProgressResult<()> {
        self.log(LogLevel::Error, message, details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn log_line_matches_the_spec_format() {
        let dir = tempfile::tempdir().unwrap();
        let workflow_id = WorkflowId::from("wf-test-1".to_string());
        let log = WorkflowLogFile::open(dir.path(), workflow_id).unwrap();
        log.info("step 1 started", json!({"step": 1})).unwrap();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        assert!(contents.contains(" - streamgank.workflow - INFO - step 1 started | STRUCTURED: {\"step\":1}"));
    }

    #[test]
    fn file_path_is_workflow_scoped() {
        let dir = tempfile::tempdir().unwrap();
        let workflow_id = WorkflowId::from("abc-123".to_string());
        let log = WorkflowLogFile::open(dir.path(), workflow_id).unwrap();
        assert_eq!(log.path().file_name().unwrap().to_str().unwrap(), "workflow_abc-123.log");
    }

    #[test]
    fn appends_across_multiple_opens() {
        let dir = tempfile::tempdir().unwrap();
        let workflow_id = WorkflowId::from("abc-456".to_string());
        {
            let log = WorkflowLogFile::open(dir.path(), workflow_id.clone()).unwrap();
            log.info("first", Value::Null).unwrap();
        }
        let log = WorkflowLogFile::open(dir.path(), workflow_id).unwrap();
        log.info("second", Value::Null).unwrap();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
