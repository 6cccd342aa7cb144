//! Vizard clip-extraction client (spec §4.3.2, §6).

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::retry::retry_http;

const BASE_URL: &str = "https://elb-api.vizard.ai/hvizard-server-front/open-api/v1";

/// Per-movie budget for the whole submit+poll+download cycle (spec §4.3.2
/// step 2).
pub const PER_MOVIE_BUDGET: Duration = Duration::from_secs(20 * 60);

#[derive(Clone)]
pub struct VizardClient {
    http: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    code: i64,
    #[serde(rename = "projectId")]
    project_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    code: i64,
    videos: Option<Vec<ClipVideo>>,
}

#[derive(Debug, Deserialize)]
struct ClipVideo {
    #[serde(rename = "videoUrl")]
    video_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Ready { clip_url: String },
    Processing,
    Failed { reason: String },
}

impl VizardClient {
    pub fn from_env() -> Result<Self, ClientError> {
        let api_key = std::env::var("VIZARD_API_KEY")
            .map_err(|_| ClientError::transport("VIZARD_API_KEY not set"))?;
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

    /// Submit a trailer URL for extraction (spec §4.3.2 step 1, §6 payload).
    pub async fn submit(&self, source_url: &str) -> Result<i64, ClientError> {
        let body = json!({
            "source_url": source_url,
            "max_clip_number": 1,
            "ratio_of_clip": 1,
            "prefer_length": [1],
            "remove_silence": 1,
            "highlight_switch": 1,
            "lang": "auto",
        });

        let url = format!("{}/project/create", self.base_url);
        let resp: SubmitResponse = retry_http("vizard_submit", || {
            let body = body.clone();
            async {
                let resp = self
                    .http
                    .post(&url)
                    .header("VIZARDAI_API_KEY", &self.api_key)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| (ClientError::Http(e), None))?;

                if !resp.status().is_success() {
                    let status = resp.status();
                    let text = resp.text().await.unwrap_or_default();
                    return Err((ClientError::bad_status(status.as_u16(), text), None));
                }
                resp.json::<SubmitResponse>()
                    .await
                    .map_err(|e| (ClientError::Http(e), None))
            }
        })
        .await?;

        if resp.code != 2000 {
            return Err(ClientError::remote_failure(
                "vizard",
                format!("submit returned code {}", resp.code),
            ));
        }
        resp.project_id
            .ok_or_else(|| ClientError::remote_failure("vizard", "submit response missing projectId"))
    }

    pub async fn poll(&self, project_id: i64) -> Result<PollOutcome, ClientError> {
        let url = format!("{}/project/query/{}", self.base_url, project_id);
        let resp = self
            .http
            .get(&url)
            .header("VIZARDAI_API_KEY", &self.api_key)
            .send()
            .await
            .map_err(ClientError::Http)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(ClientError::bad_status(status.as_u16(), text));
        }

        let parsed: StatusResponse = resp.json().await.map_err(ClientError::Http)?;
        match parsed.code {
            2000 => match parsed.videos.and_then(|v| v.into_iter().next()) {
                Some(video) if !video.video_url.is_empty() => Ok(PollOutcome::Ready {
                    clip_url: video.video_url,
                }),
                _ => Ok(PollOutcome::Processing),
            },
            1000 | 1001 => Ok(PollOutcome::Processing),
            other => Ok(PollOutcome::Failed {
                reason: format!("project returned code {other}"),
            }),
        }
    }

    /// Submit + poll until ready or `PER_MOVIE_BUDGET` elapses (spec §4.3.2
    /// steps 1-2). Does not download; callers pass the returned clip URL to
    /// the Cloudinary client (step 3).
    pub async fn extract_clip_url(&self, source_url: &str) -> Result<String, ClientError> {
        let project_id = self.submit(source_url).await?;
        let started = Instant::now();
        loop {
            match self.poll(project_id).await {
                Ok(PollOutcome::Ready { clip_url }) => return Ok(clip_url),
                Ok(PollOutcome::Failed { reason }) => {
                    return Err(ClientError::remote_failure("vizard", reason));
                }
                Ok(PollOutcome::Processing) => {}
                Err(e) if e.is_retryable() => {
                    warn!("vizard poll transport error, will retry: {e}");
                }
                Err(e) => return Err(e),
            }

            if started.elapsed() >= PER_MOVIE_BUDGET {
                return Err(ClientError::timeout(format!(
                    "vizard project {project_id} after {:?}",
                    PER_MOVIE_BUDGET
                )));
            }
            debug!("vizard project {project_id} still processing");
            tokio::time::sleep(Duration::from_secs(15)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn submit_returns_project_id_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/project/create"))
            .and(header("VIZARDAI_API_KEY", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 2000,
                "projectId": 42,
            })))
            .mount(&server)
            .await;

        let client = VizardClient::with_base_url("test-key", server.uri());
        let id = client.submit("https://example.com/trailer.mp4").await.unwrap();
        assert_eq!(id, 42);
    }

    #[tokio::test]
    async fn poll_reports_ready_with_clip_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/project/query/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 2000,
                "videos": [{ "videoUrl": "https://cdn.example.com/clip.mp4" }],
            })))
            .mount(&server)
            .await;

        let client = VizardClient::with_base_url("test-key", server.uri());
        let outcome = client.poll(42).await.unwrap();
        assert_eq!(
            outcome,
            PollOutcome::Ready {
                clip_url: "https://cdn.example.com/clip.mp4".to_string()
            }
        );
    }

    #[tokio::test]
    async fn poll_reports_processing_while_queued() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/project/query/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 1000,
                "videos": null,
            })))
            .mount(&server)
            .await;

        let client = VizardClient::with_base_url("test-key", server.uri());
        assert_eq!(client.poll(7).await.unwrap(), PollOutcome::Processing);
    }
}
