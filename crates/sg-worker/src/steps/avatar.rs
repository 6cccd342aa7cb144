//! Step 4: parallel HeyGen avatar-video rendering (spec §4.4).
//!
//! Submission and polling both run per-slot, bounded by
//! `WorkerConfig::parallelism_for`; this module reimplements the adaptive
//! poll loop from `sg_clients::heygen` (rather than calling
//! `HeyGenClient::poll_until_done`) so every iteration can observe
//! cancellation, matching the same pattern used for Vizard in
//! `steps::assets`.

use std::time::{Duration, Instant};

use futures_util::{stream, StreamExt};
use tracing::warn;

use sg_cache::StepCache;
use sg_clients::heygen::{poll_interval_for, poll_timeout, PollOutcome};
use sg_clients::HeyGenClient;
use sg_models::{AvatarJob, AvatarJobStatus, Movie, ScriptBundle, WorkflowId};

use crate::cancel::Cancellation;
use crate::error::{WorkerError, WorkerResult};

const CACHE_KEY: &str = "avatar_jobs";

pub async fn run(
    heygen: &HeyGenClient,
    movies: &[Movie],
    scripts: &ScriptBundle,
    template_override: Option<&str>,
    parallelism: usize,
    workflow_id: &WorkflowId,
    cache: &StepCache,
    cancel: &Cancellation,
) -> WorkerResult<Vec<AvatarJob>> {
    if let Some(cached) = cache.read::<Vec<AvatarJob>>(workflow_id, CACHE_KEY).await {
        return Ok(cached);
    }

    let results: Vec<WorkerResult<AvatarJob>> = stream::iter(movies.iter().enumerate())
        .map(|(idx, movie)| {
            let mut cancel = cancel.clone();
            async move {
                let slot = Movie::slot_name(idx);
                let script_text = scripts.individual.get(&slot).map(String::as_str).unwrap_or("");
                prepare_avatar_job(heygen, movie, idx, script_text, template_override, &mut cancel).await
            }
        })
        .buffer_unordered(parallelism)
        .collect()
        .await;

    let mut jobs = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Err(WorkerError::Cancelled) => return Err(WorkerError::Cancelled),
            Err(e) => return Err(e),
            Ok(job) => jobs.push(job),
        }
    }

    let failed: Vec<&str> = jobs
        .iter()
        .filter(|j| j.status == AvatarJobStatus::Failed)
        .map(|j| j.slot.as_str())
        .collect();
    if !failed.is_empty() {
        return Err(WorkerError::AvatarRenderFailed(format!(
            "avatar rendering failed for slot(s): {}",
            failed.join(", ")
        )));
    }

    cache.write(workflow_id, CACHE_KEY, &jobs).await.ok();

    Ok(jobs)
}

async fn prepare_avatar_job(
    heygen: &HeyGenClient,
    movie: &Movie,
    idx: usize,
    script_text: &str,
    template_override: Option<&str>,
    cancel: &mut Cancellation,
) -> WorkerResult<AvatarJob> {
    cancel.check()?;
    let slot = Movie::slot_name(idx);
    let genre = movie.genres.first().map(String::as_str).unwrap_or("");
    let template_id = HeyGenClient::template_id_for(genre, template_override);
    let script_chars = script_text.chars().count();

    let mut job = match heygen.submit(&template_id, &movie.title, script_text).await {
        Ok(external_id) => AvatarJob::new(slot, external_id, script_chars),
        Err(e) => {
            warn!("heygen submit failed for slot {slot}: {e}");
            let mut job = AvatarJob::new(slot, "", script_chars);
            job.mark_failed();
            return Ok(job);
        }
    };
    job.mark_processing();

    let timeout = poll_timeout(job.script_length_chars);
    let started = Instant::now();
    let mut elapsed_hint = Duration::ZERO;

    loop {
        cancel.check()?;
        match heygen.poll(&job.external_id).await {
            Ok(PollOutcome::Completed { video_url }) => {
                job.mark_completed(video_url);
                return Ok(job);
            }
            Ok(PollOutcome::Failed { reason }) => {
                warn!("heygen video {} failed: {reason}", job.external_id);
                job.mark_failed();
                return Ok(job);
            }
            Ok(PollOutcome::StillProcessing) => {}
            Err(e) if e.is_retryable() => {
                job.retry_count += 1;
                warn!("heygen poll transport error for {}, will retry: {e}", job.external_id);
            }
            Err(e) => {
                warn!("heygen poll error for {}: {e}", job.external_id);
                job.mark_failed();
                return Ok(job);
            }
        }

        if started.elapsed() >= timeout {
            warn!("heygen video {} timed out after {:?}", job.external_id, timeout);
            job.mark_failed();
            return Ok(job);
        }

        let interval = poll_interval_for(elapsed_hint);
        cancel.cancellable_sleep(interval).await?;
        elapsed_hint += interval;
    }
}
