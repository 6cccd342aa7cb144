//! Progress events emitted (not stored) over the webhook channel (spec §6).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::JobId;

/// Per-event lifecycle marker for a pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Started,
    Completed,
    Failed,
    /// Emitted once render handoff succeeds, carrying the Creatomate render id.
    CreatomateReady,
}

/// A single step-update payload POSTed to the webhook endpoint.
///
/// `sequence` is assigned from a monotonic `AtomicU64` per job so that
/// out-of-order delivery on the receiving end can still be reordered
/// (spec invariant 8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub job_id: JobId,
    pub step_number: u8,
    pub step_name: String,
    pub status: ProgressStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub details: Value,
    pub sequence: u64,
    pub timestamp: f64,
}

impl ProgressEvent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        job_id: JobId,
        step_number: u8,
        step_name: impl Into<String>,
        status: ProgressStatus,
        duration: Option<f64>,
        details: Value,
        sequence: u64,
    ) -> Self {
        Self {
            job_id,
            step_number,
            step_name: step_name.into(),
            status,
            duration,
            details,
            sequence,
            timestamp: unix_timestamp_now(),
        }
    }
}

fn unix_timestamp_now() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_without_null_detail_noise() {
        let ev = ProgressEvent::new(
            JobId::new(),
            1,
            "catalog_extraction",
            ProgressStatus::Started,
            None,
            Value::Null,
            0,
        );
        let json = serde_json::to_value(&ev).unwrap();
        assert!(json.get("duration").is_none());
        assert!(json.get("details").is_none());
    }
}
