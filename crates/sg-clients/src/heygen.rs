//! HeyGen avatar-video client (spec §4.4, §6).

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use sg_config::heygen_template_for_genre;
use sg_models::estimate_duration_minutes;

use crate::error::ClientError;
use crate::retry::retry_http;

const BASE_URL: &str = "https://api.heygen.com";

#[derive(Clone)]
pub struct HeyGenClient {
    http: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    data: SubmitData,
}

#[derive(Debug, Deserialize)]
struct SubmitData {
    #[serde(alias = "task_id")]
    video_id: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    data: StatusData,
}

#[derive(Debug, Deserialize)]
struct StatusData {
    status: String,
    video_url: Option<String>,
}

/// Outcome of a single completed/failed poll (spec §4.4 step 3).
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Completed { video_url: String },
    Failed { reason: String },
    StillProcessing,
}

impl HeyGenClient {
    pub fn from_env() -> Result<Self, ClientError> {
        let api_key = std::env::var("HEYGEN_API_KEY")
            .map_err(|_| ClientError::transport("HEYGEN_API_KEY not set"))?;
        Ok(Self {
            http: Client::new(),
            api_key,
            base_url: BASE_URL.to_string(),
        })
    }

    #[cfg(test)]
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    /// Choose the template ID for a genre, allowing a job-level override
    /// (spec §4.4.2).
    pub fn template_id_for(genre: &str, override_id: Option<&str>) -> String {
        override_id
            .map(str::to_string)
            .unwrap_or_else(|| heygen_template_for_genre(genre).to_string())
    }

    /// Submit one avatar-video render (spec §4.4 step 1, §6). Returns the
    /// external job id.
    pub async fn submit(&self, template_id: &str, title: &str, script_text: &str) -> Result<String, ClientError> {
        let body = json!({
            "caption": false,
            "title": title,
            "variables": {
                "script": {
                    "name": "script",
                    "type": "text",
                    "properties": { "content": script_text }
                }
            }
        });

        let url = format!("{}/v2/template/{}/generate", self.base_url, template_id);
        let response = retry_http("heygen_submit", || {
            let body = body.clone();
            async {
                let resp = self
                    .http
                    .post(&url)
                    .header("X-Api-Key", &self.api_key)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| (ClientError::Http(e), None))?;

                let retry_after = retry_after_from(&resp);
                if !resp.status().is_success() {
                    let status = resp.status();
                    let text = resp.text().await.unwrap_or_default();
                    return Err((ClientError::bad_status(status.as_u16(), text), retry_after));
                }
                resp.json::<SubmitResponse>()
                    .await
                    .map_err(|e| (ClientError::Http(e), None))
            }
        })
        .await?;

        Ok(response.data.video_id)
    }

    /// Poll once. Callers drive the adaptive-interval loop themselves
    /// (spec §4.4 step 2) via `poll_interval_for`.
    pub async fn poll(&self, external_id: &str) -> Result<PollOutcome, ClientError> {
        let url = format!("{}/v1/video_status.get", self.base_url);
        let resp = self
            .http
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .query(&[("video_id", external_id)])
            .send()
            .await
            .map_err(ClientError::Http)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(ClientError::bad_status(status.as_u16(), text));
        }

        let parsed: StatusResponse = resp.json().await.map_err(ClientError::Http)?;
        match parsed.data.status.as_str() {
            "completed" => match parsed.data.video_url {
                Some(url) if !url.is_empty() => Ok(PollOutcome::Completed { video_url: url }),
                _ => Ok(PollOutcome::Failed {
                    reason: "completed status with no video_url".to_string(),
                }),
            },
            "failed" | "error" => Ok(PollOutcome::Failed {
                reason: format!("terminal status: {}", parsed.data.status),
            }),
            other => {
                debug!("heygen {external_id} still {other}");
                Ok(PollOutcome::StillProcessing)
            }
        }
    }

    /// Poll `external_id` until completion, failure, or the per-job
    /// timeout, using the adaptive interval schedule of spec §4.4 step 2.
    pub async fn poll_until_done(
        &self,
        external_id: &str,
        script_length_chars: usize,
    ) -> Result<String, ClientError> {
        let timeout = poll_timeout(script_length_chars);
        let started = Instant::now();
        let mut elapsed_hint = Duration::ZERO;

        loop {
            match self.poll(external_id).await {
                Ok(PollOutcome::Completed { video_url }) => return Ok(video_url),
                Ok(PollOutcome::Failed { reason }) => {
                    return Err(ClientError::remote_failure("heygen", reason));
                }
                Ok(PollOutcome::StillProcessing) => {}
                Err(e) if e.is_retryable() => {
                    warn!("heygen poll transport error, will retry: {e}");
                }
                Err(e) => return Err(e),
            }

            if started.elapsed() >= timeout {
                return Err(ClientError::timeout(format!(
                    "heygen video {external_id} after {:?}",
                    timeout
                )));
            }

            let interval = poll_interval_for(elapsed_hint);
            tokio::time::sleep(interval).await;
            elapsed_hint += interval;
        }
    }
}

fn retry_after_from(resp: &reqwest::Response) -> Option<Duration> {
    resp.headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Adaptive poll interval by elapsed time (spec §4.4 step 2):
/// 10s for the first 120s, 15s to 300s, 20s to 600s, 30s thereafter.
pub fn poll_interval_for(elapsed: Duration) -> Duration {
    let secs = elapsed.as_secs();
    if secs < 120 {
        Duration::from_secs(10)
    } else if secs < 300 {
        Duration::from_secs(15)
    } else if secs < 600 {
        Duration::from_secs(20)
    } else {
        Duration::from_secs(30)
    }
}

/// Per-job poll timeout: `estimate(script_length) + 5min`, clamped to
/// [8, 25] minutes (spec §4.4 step 2 / §4.4.1).
pub fn poll_timeout(script_length_chars: usize) -> Duration {
    let estimate_minutes = estimate_duration_minutes(script_length_chars);
    let with_buffer = (estimate_minutes + 5.0).clamp(8.0, 25.0);
    Duration::from_secs_f64(with_buffer * 60.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_interval_follows_the_adaptive_schedule() {
        assert_eq!(poll_interval_for(Duration::from_secs(0)), Duration::from_secs(10));
        assert_eq!(poll_interval_for(Duration::from_secs(119)), Duration::from_secs(10));
        assert_eq!(poll_interval_for(Duration::from_secs(120)), Duration::from_secs(15));
        assert_eq!(poll_interval_for(Duration::from_secs(300)), Duration::from_secs(20));
        assert_eq!(poll_interval_for(Duration::from_secs(600)), Duration::from_secs(30));
    }

    #[test]
    fn poll_timeout_is_clamped_to_8_25_minutes() {
        assert_eq!(poll_timeout(100), Duration::from_secs_f64(9.0 * 60.0));
        assert_eq!(poll_timeout(5000), Duration::from_secs_f64(17.0 * 60.0));
    }

    #[test]
    fn template_selection_prefers_override() {
        assert_eq!(HeyGenClient::template_id_for("Horror", Some("custom")), "custom");
        assert_eq!(
            HeyGenClient::template_id_for("Horror", None),
            "e2ad0e5c7e71483991536f5c93594e42"
        );
    }
}
