//! Cloudinary media CDN client (spec §4.3.1/§4.3.2 step 3, §6).
//!
//! Uploads go over a plain multipart POST (Cloudinary's unsigned/signed
//! upload API is multipart-form, not S3-compatible) with the familiar
//! config-from-env, `upload_bytes`/`upload_file`, retry-wrapped send shape.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;
use tracing::debug;

use sg_config::TransformPreset;

use crate::error::ClientError;
use crate::retry::retry_http;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct CloudinaryClient {
    http: Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadResult {
    pub secure_url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration: Option<f64>,
}

impl CloudinaryClient {
    pub fn from_env() -> Result<Self, ClientError> {
        let cloud_name = std::env::var("CLOUDINARY_CLOUD_NAME")
            .map_err(|_| ClientError::transport("CLOUDINARY_CLOUD_NAME not set"))?;
        let api_key = std::env::var("CLOUDINARY_API_KEY")
            .map_err(|_| ClientError::transport("CLOUDINARY_API_KEY not set"))?;
        let api_secret = std::env::var("CLOUDINARY_API_SECRET")
            .map_err(|_| ClientError::transport("CLOUDINARY_API_SECRET not set"))?;
        Ok(Self {
            http: Client::new(),
            cloud_name,
            api_key,
            api_secret,
        })
    }

    #[cfg(test)]
    pub fn with_cloud_name(cloud_name: impl Into<String>, api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    #[cfg(test)]
    fn base_url_override(&self) -> Option<String> {
        std::env::var("CLOUDINARY_TEST_BASE_URL").ok()
    }

    fn upload_endpoint(&self, resource_type: &str) -> String {
        #[cfg(test)]
        if let Some(base) = self.base_url_override() {
            return format!("{base}/{resource_type}/upload");
        }
        format!(
            "https://api.cloudinary.com/v1_1/{}/{resource_type}/upload",
            self.cloud_name
        )
    }

    /// Upload raw bytes with a deterministic `public_id` and an optional
    /// transformation preset (spec §6). `resource_type` is `"image"` or
    /// `"video"`.
    pub async fn upload_bytes(
        &self,
        data: Vec<u8>,
        public_id: &str,
        resource_type: &str,
        preset: Option<TransformPreset>,
    ) -> Result<UploadResult, ClientError> {
        let timestamp = unix_timestamp();
        let transformation = preset.map(|p| p.params().to_cloudinary_string());

        let mut signable = vec![format!("public_id={public_id}"), format!("timestamp={timestamp}")];
        if let Some(t) = &transformation {
            signable.push(format!("transformation={t}"));
        }
        signable.sort();
        let signature = sign(&signable.join("&"), &self.api_secret);

        let url = self.upload_endpoint(resource_type);

        debug!("uploading {} bytes to cloudinary as {public_id}", data.len());

        retry_http("cloudinary_upload", || {
            let data = data.clone();
            let transformation = transformation.clone();
            async {
                let mut form = Form::new()
                    .part("file", Part::bytes(data).file_name("upload.bin"))
                    .text("public_id", public_id.to_string())
                    .text("api_key", self.api_key.clone())
                    .text("timestamp", timestamp.to_string())
                    .text("signature", signature.clone());
                if let Some(t) = transformation {
                    form = form.text("transformation", t);
                }

                let resp = self
                    .http
                    .post(&url)
                    .multipart(form)
                    .send()
                    .await
                    .map_err(|e| (ClientError::Http(e), None))?;

                if !resp.status().is_success() {
                    let status = resp.status();
                    let text = resp.text().await.unwrap_or_default();
                    return Err((ClientError::bad_status(status.as_u16(), text), None));
                }
                resp.json::<UploadResult>()
                    .await
                    .map_err(|e| (ClientError::Http(e), None))
            }
        })
        .await
    }

    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        public_id: &str,
        resource_type: &str,
        preset: Option<TransformPreset>,
    ) -> Result<UploadResult, ClientError> {
        let bytes = tokio::fs::read(path.as_ref()).await.map_err(ClientError::Io)?;
        self.upload_bytes(bytes, public_id, resource_type, preset).await
    }
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_secs()
}

fn sign(payload: &str, secret: &str) -> String {
    let signed = format!("{payload}{secret}");
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(signed.as_bytes());
    let digest = mac.finalize().into_bytes();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_config::TransformPreset;
    use serial_test::serial;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    #[serial]
    async fn upload_bytes_returns_secure_url() {
        let server = MockServer::start().await;
        std::env::set_var("CLOUDINARY_TEST_BASE_URL", server.uri());
        Mock::given(method("POST"))
            .and(path("/image/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "secure_url": "https://res.cloudinary.com/demo/image/upload/v1/movie_posters/foo.jpg",
                "width": 1080,
                "height": 1920,
            })))
            .mount(&server)
            .await;

        let client = CloudinaryClient::with_cloud_name("demo", "key", "secret");
        let result = client
            .upload_bytes(vec![1, 2, 3], "movie_posters/foo", "image", Some(TransformPreset::VerticalPortraitFill))
            .await
            .unwrap();
        assert_eq!(
            result.secure_url,
            "https://res.cloudinary.com/demo/image/upload/v1/movie_posters/foo.jpg"
        );
        std::env::remove_var("CLOUDINARY_TEST_BASE_URL");
    }

    #[test]
    fn signature_is_deterministic_for_same_input() {
        let a = sign("public_id=foo&timestamp=1", "secret");
        let b = sign("public_id=foo&timestamp=1", "secret");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }
}
