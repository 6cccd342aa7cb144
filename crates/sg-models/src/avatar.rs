//! Avatar video render job, one per slot, produced by step 4.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a single avatar video render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvatarJobStatus {
    Submitted,
    Processing,
    Completed,
    Failed,
}

impl AvatarJobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One slot's avatar-video render job and its outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarJob {
    pub slot: String,
    pub external_id: String,
    pub status: AvatarJobStatus,
    pub result_url: Option<String>,
    pub retry_count: u32,
    pub script_length_chars: usize,
}

impl AvatarJob {
    pub fn new(slot: impl Into<String>, external_id: impl Into<String>, script_length_chars: usize) -> Self {
        Self {
            slot: slot.into(),
            external_id: external_id.into(),
            status: AvatarJobStatus::Submitted,
            result_url: None,
            retry_count: 0,
            script_length_chars,
        }
    }

    pub fn mark_processing(&mut self) {
        if self.status == AvatarJobStatus::Submitted {
            self.status = AvatarJobStatus::Processing;
        }
    }

    pub fn mark_completed(&mut self, result_url: impl Into<String>) {
        self.status = AvatarJobStatus::Completed;
        self.result_url = Some(result_url.into());
    }

    pub fn mark_failed(&mut self) {
        self.status = AvatarJobStatus::Failed;
    }
}

/// Estimate the expected HeyGen completion time for a script, per spec
/// §4.4.1. Used to pace polling and progress logs; the poll *timeout* is
/// this estimate plus a 5 minute buffer, clamped to [8, 25] minutes
/// (see `sg_clients::heygen::poll_timeout`).
pub fn estimate_duration_minutes(script_length_chars: usize) -> f64 {
    if script_length_chars <= 300 {
        4.0
    } else if script_length_chars <= 800 {
        6.0
    } else {
        (3.0 + (script_length_chars as f64 / 200.0)).min(12.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_estimate_bands() {
        assert_eq!(estimate_duration_minutes(100), 4.0);
        assert_eq!(estimate_duration_minutes(300), 4.0);
        assert_eq!(estimate_duration_minutes(301), 6.0);
        assert_eq!(estimate_duration_minutes(800), 6.0);
        assert!((estimate_duration_minutes(801) - (3.0 + 801.0 / 200.0)).abs() < 1e-9);
        assert_eq!(estimate_duration_minutes(10_000), 12.0);
    }

    #[test]
    fn terminal_statuses() {
        assert!(!AvatarJobStatus::Submitted.is_terminal());
        assert!(!AvatarJobStatus::Processing.is_terminal());
        assert!(AvatarJobStatus::Completed.is_terminal());
        assert!(AvatarJobStatus::Failed.is_terminal());
    }
}
