//! Creatomate compositor client (spec §4.7, §6). Structurally identical to
//! `HeyGenClient`'s submit/poll shape, against a different wire format.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::ClientError;
use crate::retry::retry_http;

const BASE_URL: &str = "https://api.creatomate.com/v1";

#[derive(Clone)]
pub struct CreatomateClient {
    http: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct RenderRequest<'a> {
    source: &'a Value,
    output_format: &'static str,
    render_scale: f32,
}

#[derive(Debug, Deserialize)]
struct RenderResponse {
    id: String,
    status: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderStatus {
    Succeeded { url: String },
    Failed { reason: String },
    InProgress(String),
}

impl CreatomateClient {
    pub fn from_env() -> Result<Self, ClientError> {
        let api_key = std::env::var("CREATOMATE_API_KEY")
            .map_err(|_| ClientError::transport("CREATOMATE_API_KEY not set"))?;
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

    /// Submit a composition for rendering (spec §4.7, §6). Returns the
    /// render id immediately; the orchestrator's step 7 hands off rather
    /// than polling to completion itself.
    pub async fn submit_render(&self, composition: &Value) -> Result<String, ClientError> {
        let body = RenderRequest {
            source: composition,
            output_format: "mp4",
            render_scale: 1.0,
        };

        let url = format!("{}/renders", self.base_url);
        let response = retry_http("creatomate_submit", || {
            let body = serde_json::to_value(&body).expect("RenderRequest always serializes");
            async {
                let resp = self
                    .http
                    .post(&url)
                    .bearer_auth(&self.api_key)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| (ClientError::Http(e), None))?;

                if !resp.status().is_success() {
                    let status = resp.status();
                    let text = resp.text().await.unwrap_or_default();
                    return Err((ClientError::bad_status(status.as_u16(), text), None));
                }

                let parsed: Value = resp.json().await.map_err(|e| (ClientError::Http(e), None))?;
                first_render(parsed).ok_or_else(|| {
                    (
                        ClientError::remote_failure("creatomate", "submit response had no render entries"),
                        None,
                    )
                })
            }
        })
        .await?;

        Ok(response.id)
    }

    pub async fn poll(&self, render_id: &str) -> Result<RenderStatus, ClientError> {
        let url = format!("{}/renders/{}", self.base_url, render_id);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(ClientError::Http)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(ClientError::bad_status(status.as_u16(), text));
        }

        let parsed: Value = resp.json().await.map_err(ClientError::Http)?;
        let status = parsed.get("status").and_then(Value::as_str).unwrap_or("unknown");
        match status {
            "succeeded" => {
                let url = parsed
                    .get("url")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_default();
                if url.is_empty() {
                    Ok(RenderStatus::Failed {
                        reason: "succeeded status with no url".to_string(),
                    })
                } else {
                    Ok(RenderStatus::Succeeded { url })
                }
            }
            "failed" => Ok(RenderStatus::Failed {
                reason: "render failed".to_string(),
            }),
            other => {
                debug!("creatomate render {render_id} still {other}");
                Ok(RenderStatus::InProgress(other.to_string()))
            }
        }
    }

    /// Poll until terminal or `max_wait` elapses. Used by the separate
    /// render-completion monitor (spec §2 step 7), not by the orchestrator
    /// itself.
    pub async fn poll_until_done(&self, render_id: &str, max_wait: Duration) -> Result<String, ClientError> {
        let started = std::time::Instant::now();
        loop {
            match self.poll(render_id).await? {
                RenderStatus::Succeeded { url } => return Ok(url),
                RenderStatus::Failed { reason } => return Err(ClientError::remote_failure("creatomate", reason)),
                RenderStatus::InProgress(_) => {}
            }
            if started.elapsed() >= max_wait {
                return Err(ClientError::timeout(format!("creatomate render {render_id}")));
            }
            tokio::time::sleep(Duration::from_secs(10)).await;
        }
    }
}

fn first_render(value: Value) -> Option<RenderResponse> {
    match value {
        Value::Array(items) => items.into_iter().find_map(|v| serde_json::from_value(v).ok()),
        obj @ Value::Object(_) => serde_json::from_value(obj).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn submit_render_handles_array_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/renders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "id": "render-1", "status": "planned" }
            ])))
            .mount(&server)
            .await;

        let client = CreatomateClient::with_base_url("key", server.uri());
        let id = client.submit_render(&serde_json::json!({"width": 1080})).await.unwrap();
        assert_eq!(id, "render-1");
    }

    #[tokio::test]
    async fn submit_render_handles_object_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/renders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(
                { "id": "render-2", "status": "planned" }
            )))
            .mount(&server)
            .await;

        let client = CreatomateClient::with_base_url("key", server.uri());
        let id = client.submit_render(&serde_json::json!({"width": 1080})).await.unwrap();
        assert_eq!(id, "render-2");
    }

    #[tokio::test]
    async fn poll_reports_succeeded_with_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/renders/render-3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "render-3",
                "status": "succeeded",
                "url": "https://cdn.creatomate.com/render-3.mp4",
            })))
            .mount(&server)
            .await;

        let client = CreatomateClient::with_base_url("key", server.uri());
        let status = client.poll("render-3").await.unwrap();
        assert_eq!(
            status,
            RenderStatus::Succeeded {
                url: "https://cdn.creatomate.com/render-3.mp4".to_string()
            }
        );
    }

    /// Scenario F: a 400 rejection is terminal, not retried as transient.
    #[tokio::test]
    async fn submit_render_rejects_on_bad_request_without_retrying() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/renders"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid composition"))
            .expect(1)
            .mount(&server)
            .await;

        let client = CreatomateClient::with_base_url("key", server.uri());
        let err = client
            .submit_render(&serde_json::json!({"width": 1080}))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::BadStatus { status: 400, .. }));
    }
}
