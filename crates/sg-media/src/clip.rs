//! Local clip-extraction fallback (spec §4.3.2 step 4): when the Vizard
//! extraction fails, fall back to downloading the trailer and cutting a
//! 15s segment with scene detection, shelling out to `ffprobe`/`ffmpeg`
//! as external processes rather than linking an in-process codec.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{MediaError, MediaResult};

const FALLBACK_CLIP_SECONDS: f64 = 15.0;

/// Find the highest-scoring scene-change timestamp in `input`, using
/// ffmpeg's `select='gt(scene,...)'` filter with `showinfo`, treating
/// ffmpeg filter output as a data source rather than only a transcoding
/// tool.
pub async fn detect_scene_cut(input: impl AsRef<Path>) -> MediaResult<f64> {
    let input = input.as_ref();
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

    let output = Command::new("ffmpeg")
        .args(["-i"])
        .arg(input)
        .args([
            "-filter:v",
            "select='gt(scene,0.3)',showinfo",
            "-f",
            "null",
            "-",
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    let first_cut = stderr
        .lines()
        .find_map(|line| line.split("pts_time:").nth(1))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|s| s.parse::<f64>().ok());

    Ok(first_cut.unwrap_or(0.0))
}

/// Trim a `duration`-second segment starting at `start` out of `input`
/// into `output`, re-encoding to keep the result self-contained
/// (spec §4.3.2 step 4).
pub async fn trim_segment(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    start: f64,
    duration: f64,
) -> MediaResult<()> {
    let input = input.as_ref();
    let output = output.as_ref();
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    debug!("trimming {:.1}s from {:.1}s of {}", duration, start, input.display());

    let result = Command::new("ffmpeg")
        .args(["-y", "-ss", &start.to_string(), "-i"])
        .arg(input)
        .args(["-t", &duration.to_string(), "-c:v", "libx264", "-c:a", "aac"])
        .arg(output)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !result.status.success() {
        return Err(MediaError::FfmpegFailed {
            message: "trim failed".to_string(),
            stderr: Some(String::from_utf8_lossy(&result.stderr).to_string()),
        });
    }

    info!("trimmed segment written to {}", output.display());
    Ok(())
}

/// Extract a fallback 15s clip using scene detection to pick the start
/// point (spec §4.3.2 step 4's local fallback path).
pub async fn extract_fallback_clip(
    trailer_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> MediaResult<()> {
    let cut_at = detect_scene_cut(&trailer_path).await?;
    trim_segment(trailer_path, output_path, cut_at, FALLBACK_CLIP_SECONDS).await
}
