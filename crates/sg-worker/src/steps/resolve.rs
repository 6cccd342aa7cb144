//! Step 5: avatar-video URL resolution (spec §4.5).
//!
//! Confirms every `AvatarJob.result_url` is reachable before composition
//! ever references it, the same HEAD-probe idiom as
//! `sg_media::download::head_ok` used for poster/trailer URLs in step 3.

use std::collections::BTreeMap;

use futures_util::{stream, StreamExt};
use reqwest::Client;

use sg_models::AvatarJob;

use crate::error::{WorkerError, WorkerResult};

/// HEAD-verify each completed avatar job's `result_url` and return a
/// `slot -> url` map (spec §4.5 postcondition). Any non-2xx response, or a
/// missing `result_url` on a job the caller believes completed, fails the
/// whole step — composition cannot proceed with a dangling reference.
pub async fn run(http: &Client, avatar_jobs: &[AvatarJob], parallelism: usize) -> WorkerResult<BTreeMap<String, String>> {
    let checks: Vec<WorkerResult<(String, String)>> = stream::iter(avatar_jobs.iter())
        .map(|job| async move {
            let url = job.result_url.clone().ok_or_else(|| {
                WorkerError::AvatarUrlInvalid(format!("slot {}: no result_url", job.slot))
            })?;

            let response = http
                .head(&url)
                .send()
                .await
                .map_err(|e| WorkerError::AvatarUrlInvalid(format!("slot {}: HEAD failed: {e}", job.slot)))?;

            if !response.status().is_success() {
                return Err(WorkerError::AvatarUrlInvalid(format!(
                    "slot {}: HEAD {} returned {}",
                    job.slot,
                    url,
                    response.status()
                )));
            }

            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("");
            if !content_type.starts_with("video/") && content_type != "application/octet-stream" {
                return Err(WorkerError::AvatarUrlInvalid(format!(
                    "slot {}: unexpected content-type {content_type} for {url}",
                    job.slot
                )));
            }

            Ok((job.slot.clone(), url))
        })
        .buffer_unordered(parallelism)
        .collect()
        .await;

    let mut urls = BTreeMap::new();
    for check in checks {
        let (slot, url) = check?;
        urls.insert(slot, url);
    }
    Ok(urls)
}
