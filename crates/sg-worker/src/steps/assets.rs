//! Step 3: parallel asset preparation (spec §4.3).
//!
//! Posters and clips are prepared per movie, bounded by
//! `WorkerConfig::parallelism_for` via `buffer_unordered`. A poster or
//! clip failure fails the whole step (`AssetGenerationFailed`); the scroll
//! screencast is independent and non-fatal (spec §4.3.3).

use std::path::Path;
use std::time::{Duration, Instant};

use futures_util::{stream, StreamExt};
use reqwest::Client;
use tracing::{info, warn};

use sg_cache::StepCache;
use sg_clients::vizard::{PollOutcome, PER_MOVIE_BUDGET};
use sg_clients::{CloudinaryClient, VizardClient};
use sg_config::{platform_badge_color, resolve_catalog_url, TransformPreset};
use sg_media::download::{download_bytes, download_file};
use sg_media::poster::{load_system_font, render_enhanced_poster};
use sg_media::{clip, screencast};
use sg_models::{AssetBundle, ErrorEntry, ErrorKind, Filter, Movie, StepName, WorkflowId};

use crate::cancel::Cancellation;
use crate::error::{WorkerError, WorkerResult};

const CACHE_KEY: &str = "assets";

#[allow(clippy::too_many_arguments)]
pub async fn run(
    http: &Client,
    cloudinary: &CloudinaryClient,
    vizard: &VizardClient,
    movies: &[Movie],
    filter: &Filter,
    job_dir: &Path,
    parallelism: usize,
    workflow_id: &WorkflowId,
    cache: &StepCache,
    cancel: &Cancellation,
) -> WorkerResult<(AssetBundle, Vec<ErrorEntry>)> {
    if let Some(cached) = cache.read::<AssetBundle>(workflow_id, CACHE_KEY).await {
        info!("asset preparation served from cache");
        return Ok((cached, Vec::new()));
    }

    let font = load_system_font()?;

    let posters_fut = stream::iter(movies.iter().enumerate())
        .map(|(idx, movie)| {
            let font = font.clone();
            async move { prepare_poster(http, cloudinary, &font, movie, idx).await }
        })
        .buffer_unordered(parallelism)
        .collect::<Vec<WorkerResult<(String, String)>>>();

    let clips_fut = stream::iter(movies.iter().enumerate())
        .map(|(idx, movie)| {
            let mut cancel = cancel.clone();
            async move { prepare_clip(http, cloudinary, vizard, job_dir, movie, idx, &mut cancel).await }
        })
        .buffer_unordered(parallelism)
        .collect::<Vec<WorkerResult<(String, String)>>>();

    let scroll_fut = prepare_scroll_video(cloudinary, filter, job_dir);

    // Spec §4.3/§9: the three sub-tasks overlap rather than run back to
    // back, so posters don't sit ahead of an up-to-20-minute clip
    // extraction in the critical path.
    let (poster_results, clip_results, scroll_result) = tokio::join!(posters_fut, clips_fut, scroll_fut);

    let mut bundle = AssetBundle::new();
    for result in poster_results {
        let (slot, url) = result?;
        bundle.posters.insert(slot, url);
    }
    for result in clip_results {
        let (slot, url) = result?;
        bundle.clips.insert(slot, url);
    }

    let mut errors = Vec::new();
    match scroll_result {
        Ok(url) => bundle.scroll_video = Some(url),
        Err(e) => {
            warn!("scroll screencast unavailable, continuing without it: {e}");
            bundle.scroll_video = None;
            errors.push(ErrorEntry::new(
                ErrorKind::ScrollVideoUnavailable(e.to_string()),
                StepName::AssetPreparation,
            ));
        }
    }

    cache.write(workflow_id, CACHE_KEY, &bundle).await.ok();

    Ok((bundle, errors))
}

async fn prepare_poster(
    http: &Client,
    cloudinary: &CloudinaryClient,
    font: &ab_glyph::FontArc,
    movie: &Movie,
    idx: usize,
) -> WorkerResult<(String, String)> {
    let slot = Movie::slot_name(idx);
    let color = platform_badge_color(&movie.platform.to_lowercase());

    let poster_bytes = match download_bytes(http, &movie.poster_url).await {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!("poster download failed for {}, using fallback card: {e}", movie.title);
            None
        }
    };

    let image = render_enhanced_poster(movie, color, poster_bytes.as_deref(), font)?;

    let mut png = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| WorkerError::AssetGenerationFailed(format!("poster encode failed: {e}")))?;

    let public_id = format!("enhanced_posters/{}_{}", movie.safe_title(), movie.id);
    let upload = cloudinary
        .upload_bytes(png, &public_id, "image", None)
        .await?;

    Ok((slot, upload.secure_url))
}

async fn prepare_clip(
    http: &Client,
    cloudinary: &CloudinaryClient,
    vizard: &VizardClient,
    job_dir: &Path,
    movie: &Movie,
    idx: usize,
    cancel: &mut Cancellation,
) -> WorkerResult<(String, String)> {
    let slot = Movie::slot_name(idx);
    let trailer_url = movie
        .trailer_url
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| {
            WorkerError::AssetGenerationFailed(format!("{slot}: movie has no trailer_url"))
        })?;

    let public_id = format!("movie_clips/{}_{}", movie.safe_title(), movie.id);

    match extract_clip_cancellable(vizard, trailer_url, cancel).await {
        Ok(clip_url) => {
            let bytes = download_bytes(http, &clip_url).await?;
            let upload = cloudinary
                .upload_bytes(bytes, &public_id, "video", Some(TransformPreset::VerticalPortraitFill))
                .await?;
            Ok((slot, upload.secure_url))
        }
        Err(e) => {
            warn!("vizard extraction failed for {}, falling back to local trim: {e}", movie.title);
            fallback_local_clip(http, cloudinary, job_dir, trailer_url, &public_id, &slot).await
        }
    }
}

async fn fallback_local_clip(
    http: &Client,
    cloudinary: &CloudinaryClient,
    job_dir: &Path,
    trailer_url: &str,
    public_id: &str,
    slot: &str,
) -> WorkerResult<(String, String)> {
    let trailer_path = job_dir.join("trailers").join(format!("{slot}.mp4"));
    let clip_path = job_dir.join("clips").join(format!("{slot}.mp4"));

    download_file(http, trailer_url, &trailer_path).await?;
    clip::extract_fallback_clip(&trailer_path, &clip_path).await?;

    let upload = cloudinary
        .upload_file(&clip_path, public_id, "video", Some(TransformPreset::VerticalPortraitFill))
        .await?;
    Ok((slot.to_string(), upload.secure_url))
}

/// Submit+poll Vizard's extraction, checking `cancel` at every iteration
/// (spec §5: poll loops are cancellable per-iteration, not only at step
/// boundaries), rather than delegating to `VizardClient::extract_clip_url`.
async fn extract_clip_cancellable(
    vizard: &VizardClient,
    source_url: &str,
    cancel: &mut Cancellation,
) -> WorkerResult<String> {
    cancel.check()?;
    let project_id = vizard.submit(source_url).await?;
    let started = Instant::now();
    loop {
        cancel.check()?;
        match vizard.poll(project_id).await {
            Ok(PollOutcome::Ready { clip_url }) => return Ok(clip_url),
            Ok(PollOutcome::Failed { reason }) => {
                return Err(WorkerError::AssetGenerationFailed(format!(
                    "vizard project {project_id} failed: {reason}"
                )));
            }
            Ok(PollOutcome::Processing) => {}
            Err(e) if e.is_retryable() => {
                warn!("vizard poll transport error for project {project_id}, will retry: {e}");
            }
            Err(e) => return Err(e.into()),
        }

        if started.elapsed() >= PER_MOVIE_BUDGET {
            return Err(WorkerError::AssetGenerationFailed(format!(
                "vizard project {project_id} exceeded {:?} budget",
                PER_MOVIE_BUDGET
            )));
        }
        cancel.cancellable_sleep(Duration::from_secs(15)).await?;
    }
}

async fn prepare_scroll_video(
    cloudinary: &CloudinaryClient,
    filter: &Filter,
    job_dir: &Path,
) -> WorkerResult<String> {
    let catalog_url = resolve_catalog_url(filter)
        .map_err(|e| WorkerError::AssetGenerationFailed(format!("catalog url: {e}")))?;
    let out_dir = job_dir.join("scroll");
    let video_path = screencast::invoke_scroll_capture(catalog_url.as_str(), &out_dir).await?;
    let upload = cloudinary
        .upload_file(&video_path, "scroll_intro/intro", "video", Some(TransformPreset::VerticalPortraitFill))
        .await?;
    Ok(upload.secure_url)
}
