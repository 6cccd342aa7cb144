//! Step 2: script generation (spec §4.2).

use std::path::Path;

use sg_cache::StepCache;
use sg_llm::{persist_scripts, ChatClient, GenerationWarning, ScriptGenerator};
use sg_models::{ErrorEntry, ErrorKind, Filter, Movie, ScriptBundle, StepName, WorkflowId};
use tracing::info;

use crate::error::WorkerResult;

const CACHE_KEY: &str = "scripts";

/// Generate the job's `ScriptBundle`, persist it to `job_dir/scripts/`, and
/// return any non-fatal `HookTimingUnmet` warnings as `ErrorEntry`s for the
/// caller to attach to `JobRecord.errors` (spec §7: non-fatal).
pub async fn run(
    chat: &ChatClient,
    movies: &[Movie],
    filter: &Filter,
    job_dir: &Path,
    workflow_id: &WorkflowId,
    cache: &StepCache,
) -> WorkerResult<(ScriptBundle, Vec<ErrorEntry>)> {
    if let Some(cached) = cache.read::<ScriptBundle>(workflow_id, CACHE_KEY).await {
        info!("script generation served from cache");
        return Ok((cached, Vec::new()));
    }

    let generator = ScriptGenerator::new(chat);
    let (bundle, warnings) = generator.generate(movies, filter).await?;

    persist_scripts(&bundle, job_dir).await?;
    cache.write(workflow_id, CACHE_KEY, &bundle).await.ok();

    let errors = warnings
        .into_iter()
        .map(|w| match w {
            GenerationWarning::HookTimingUnmet { slot, word_count } => ErrorEntry::new(
                ErrorKind::HookTimingUnmet(format!(
                    "slot {slot}: word count {word_count} never reached the [24, 32] band"
                )),
                StepName::ScriptGeneration,
            ),
        })
        .collect();

    Ok((bundle, errors))
}
