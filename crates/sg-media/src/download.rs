//! Trailer and poster download over HTTP (spec §4.3.1 step 1, §4.3.2 step 4
//! fallback). Trailer/poster URLs here are plain HTTPS media URLs served by
//! the catalog/CDN, not arbitrary video-platform pages, so a direct
//! `reqwest` GET is the right tool rather than a `yt-dlp`-style extractor.

use std::path::Path;

use reqwest::Client;
use tracing::{debug, info};

use crate::error::{MediaError, MediaResult};

/// Download a URL to a local path, creating parent directories as needed.
pub async fn download_file(client: &Client, url: &str, dest: impl AsRef<Path>) -> MediaResult<()> {
    let dest = dest.as_ref();
    debug!("downloading {} to {}", url, dest.display());

    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(MediaError::download_failed(format!(
            "GET {} returned {}",
            url,
            response.status()
        )));
    }

    let bytes = response.bytes().await?;
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(dest, &bytes).await?;

    info!(
        "downloaded {} ({} bytes) to {}",
        url,
        bytes.len(),
        dest.display()
    );
    Ok(())
}

/// Download a URL into memory (used for short-lived transforms like
/// poster compositing that never need the file on disk).
pub async fn download_bytes(client: &Client, url: &str) -> MediaResult<Vec<u8>> {
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(MediaError::download_failed(format!(
            "GET {} returned {}",
            url,
            response.status()
        )));
    }
    Ok(response.bytes().await?.to_vec())
}

/// HEAD a URL and confirm it resolves with a 2xx status (spec §4.3
/// post-condition: "every URL is HTTPS and resolves (HEAD 200)").
pub async fn head_ok(client: &Client, url: &str) -> MediaResult<bool> {
    let response = client.head(url).send().await?;
    Ok(response.status().is_success())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn head_ok_reports_2xx() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/poster.jpg"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = Client::new();
        let url = format!("{}/poster.jpg", server.uri());
        assert!(head_ok(&client, &url).await.unwrap());
    }
}
