//! Scroll-screencast invocation (spec §4.3.3). The browser-automation tool
//! itself is explicitly out of scope (spec §1): this module shells out to
//! it as a black box via `tokio::process::Command` rather than embedding
//! a browser.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{info, warn};

use crate::error::{MediaError, MediaResult};

/// Viewport and duration fixed by spec §4.3.3 / §6.
pub const VIEWPORT_WIDTH: u32 = 390;
pub const VIEWPORT_HEIGHT: u32 = 844;
pub const CAPTURE_SECONDS: u32 = 6;

/// Name of the external screencast binary, overridable for testing.
const DEFAULT_BINARY: &str = "streamgank-screencast";

/// Invoke the external screencast capturer against `catalog_url`, writing
/// a 6s vertical MP4 under `out_dir`. Best-effort: failure returns
/// `Err`, and the caller (step 3) downgrades to a static intro image
/// rather than failing the whole step (spec §4.3.3, non-fatal).
pub async fn invoke_scroll_capture(catalog_url: &str, out_dir: &Path) -> MediaResult<PathBuf> {
    let binary = std::env::var("SCREENCAST_BINARY").unwrap_or_else(|_| DEFAULT_BINARY.to_string());
    which::which(&binary).map_err(|_| {
        MediaError::ScreencastFailed(format!("{binary} not found on PATH"))
    })?;

    tokio::fs::create_dir_all(out_dir).await?;
    let out_path = out_dir.join("scroll_intro.mp4");

    info!("invoking {binary} for {catalog_url} -> {}", out_path.display());

    let run = Command::new(&binary)
        .args([
            "--url",
            catalog_url,
            "--viewport",
            &format!("{VIEWPORT_WIDTH}x{VIEWPORT_HEIGHT}"),
            "--duration",
            &CAPTURE_SECONDS.to_string(),
            "--out",
        ])
        .arg(&out_path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output();

    let output = tokio::time::timeout(Duration::from_secs(60), run)
        .await
        .map_err(|_| MediaError::ScreencastFailed("timed out after 60s".to_string()))??;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!("screencast invoker exited non-zero: {stderr}");
        return Err(MediaError::ScreencastFailed(stderr.to_string()));
    }

    if !out_path.exists() {
        return Err(MediaError::ScreencastFailed("no output file produced".to_string()));
    }

    Ok(out_path)
}
