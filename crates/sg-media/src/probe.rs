//! FFprobe-backed video duration probing (spec §4.8): a `probe_url_duration`
//! entry point that HEADs a remote URL first before falling back to a
//! local download + probe.

use std::path::Path;
use std::process::Stdio;

use reqwest::Client;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::download::{download_file, head_ok};
use crate::error::{MediaError, MediaResult};

/// Video file information as read by `ffprobe`.
#[derive(Debug, Clone)]
pub struct VideoInfo {
    pub duration: f64,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    width: Option<u32>,
    height: Option<u32>,
}

/// Probe a local video file for duration/dimensions.
pub async fn probe_video(path: impl AsRef<Path>) -> MediaResult<VideoInfo> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: "ffprobe exited non-zero".to_string(),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)?;
    let video_stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or_else(|| MediaError::InvalidVideo("no video stream found".to_string()))?;

    let duration = probe
        .format
        .duration
        .as_ref()
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    Ok(VideoInfo {
        duration,
        width: video_stream.width.unwrap_or(0),
        height: video_stream.height.unwrap_or(0),
    })
}

/// Probe a remote avatar-video URL's duration (spec §4.8): HEAD first,
/// then fetch and probe locally if the server accepts ranged/full
/// downloads. On any failure, the caller should fall back to the
/// `length_chars / 15` estimate named in spec §4.8 — this function
/// surfaces the failure rather than performing that fallback itself, since
/// the estimate needs `length_chars`, which this module doesn't have.
pub async fn probe_remote_duration(
    client: &Client,
    url: &str,
    scratch_dir: &Path,
) -> MediaResult<f64> {
    if !head_ok(client, url).await? {
        return Err(MediaError::download_failed(format!("HEAD {url} did not return 2xx")));
    }

    let tmp_path = scratch_dir.join(format!("probe-{}.mp4", uuid_like()));
    download_file(client, url, &tmp_path).await?;

    let result = probe_video(&tmp_path).await;
    if let Err(ref e) = result {
        warn!("probe of downloaded {} failed: {e}", url);
    }
    let _ = tokio::fs::remove_file(&tmp_path).await;
    debug!("probed {} -> {:?}", url, result.as_ref().map(|v| v.duration));
    result.map(|v| v.duration)
}

fn uuid_like() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    format!(
        "{:x}",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    )
}

/// Fallback estimate used when probing fails (spec §4.8): roughly 15
/// characters of script per second of avatar speech.
pub fn estimate_duration_from_chars(length_chars: usize) -> f64 {
    (length_chars as f64 / 15.0).max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_estimate_has_a_floor() {
        assert!((estimate_duration_from_chars(0) - 1.0).abs() < 1e-9);
        assert!((estimate_duration_from_chars(150) - 10.0).abs() < 1e-9);
    }
}
