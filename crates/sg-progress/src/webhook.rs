//! Fire-and-forget progress webhook emitter (spec §6 / §9 "Progress
//! observer decoupling"): an HTTP POST per progress event, following the
//! original `utils/webhook_client.py`'s base-URL-plus-job-id shape and
//! 5s timeout.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use sg_models::{JobId, ProgressEvent, ProgressStatus};

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);
const STEP_UPDATE_PATH: &str = "/api/webhooks/step-update";

/// Emits `ProgressEvent`s to the configured webhook endpoint. Never
/// propagates a failure to the caller: a bad response or a transport error
/// is logged and swallowed, exactly as spec §9 requires of the progress
/// observer.
#[derive(Clone)]
pub struct WebhookEmitter {
    http: Client,
    base_url: Option<String>,
    job_id: JobId,
    sequence: Arc<AtomicU64>,
}

impl WebhookEmitter {
    /// `base_url` of `None` disables emission entirely (still returns a
    /// usable emitter so callers don't need to special-case "no webhook
    /// configured").
    pub fn new(base_url: Option<String>, job_id: JobId) -> Self {
        let base_url = base_url.map(|u| u.trim_end_matches('/').to_string());
        Self {
            http: Client::builder()
                .timeout(WEBHOOK_TIMEOUT)
                .build()
                .expect("reqwest client builds with a fixed timeout"),
            base_url,
            job_id,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn from_env(job_id: JobId) -> Self {
        Self::new(std::env::var("WEBHOOK_BASE_URL").ok(), job_id)
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst)
    }

    /// Emit a step-update event. Spawns the actual HTTP call so the caller
    /// never blocks on network I/O; errors are logged, not returned.
    pub fn emit(&self, step_number: u8, step_name: impl Into<String>, status: ProgressStatus, duration: Option<f64>, details: Value) {
        let Some(base_url) = self.base_url.clone() else {
            debug!("no WEBHOOK_BASE_URL configured, skipping progress emission");
            return;
        };

        let event = ProgressEvent::new(self.job_id.clone(), step_number, step_name, status, duration, details, self.next_sequence());
        let http = self.http.clone();
        let url = format!("{base_url}{STEP_UPDATE_PATH}");

        tokio::spawn(async move {
            match http.post(&url).json(&event).send().await {
                Ok(resp) if resp.status().is_success() => {
                    debug!("webhook delivered: step {} {:?}", event.step_number, event.status);
                }
                Ok(resp) => {
                    warn!("webhook returned {}: step {}", resp.status(), event.step_number);
                }
                Err(e) => {
                    warn!("webhook failed for step {}: {e}", event.step_number);
                }
            }
        });
    }

    pub fn step_started(&self, step_number: u8, step_name: impl Into<String>) {
        self.emit(step_number, step_name, ProgressStatus::Started, None, Value::Null);
    }

    pub fn step_completed(&self, step_number: u8, step_name: impl Into<String>, duration: f64, details: Value) {
        self.emit(step_number, step_name, ProgressStatus::Completed, Some(duration), details);
    }

    pub fn step_failed(&self, step_number: u8, step_name: impl Into<String>, details: Value) {
        self.emit(step_number, step_name, ProgressStatus::Failed, None, details);
    }

    pub fn creatomate_ready(&self, render_id: &str) {
        self.emit(
            7,
            "Render Handoff",
            ProgressStatus::CreatomateReady,
            None,
            serde_json::json!({ "render_id": render_id }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn emit_posts_to_step_update_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/webhooks/step-update"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let emitter = WebhookEmitter::new(Some(server.uri()), JobId::new());
        emitter.step_started(1, "Catalog Extraction");

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn sequence_is_strictly_increasing() {
        let emitter = WebhookEmitter::new(None, JobId::new());
        let first = emitter.next_sequence();
        let second = emitter.next_sequence();
        assert!(second > first);
    }

    #[tokio::test]
    async fn disabled_emitter_does_not_panic() {
        let emitter = WebhookEmitter::new(None, JobId::new());
        emitter.step_started(1, "Catalog Extraction");
    }
}
