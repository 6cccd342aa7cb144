//! The `Orchestrator`: ties the seven steps together, owns every external
//! client, and is the sole mutator of `JobRecord` (spec §5, §7). Drives
//! each step in sequence, recording timings and emitting progress as it
//! goes.

use std::time::Instant;

use serde_json::json;
use tracing::{info, warn};

use sg_cache::StepCache;
use sg_catalog::CatalogClient;
use sg_clients::{CloudinaryClient, CreatomateClient, HeyGenClient, VizardClient};
use sg_config::WorkerConfig;
use sg_llm::ChatClient;
use sg_models::{ErrorEntry, ErrorKind, Filter, JobRecord, StepName};
use sg_progress::{WebhookEmitter, WorkflowLogFile};

use crate::cancel::Cancellation;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::steps;
use crate::tempdir::JobTempDir;

/// Owns the long-lived clients for every external dependency and runs one
/// job at a time through all seven steps.
pub struct Orchestrator {
    config: WorkerConfig,
    catalog: CatalogClient,
    chat: ChatClient,
    heygen: HeyGenClient,
    vizard: VizardClient,
    cloudinary: CloudinaryClient,
    creatomate: CreatomateClient,
    http: reqwest::Client,
    cache: StepCache,
}

impl Orchestrator {
    pub async fn new(config: WorkerConfig) -> WorkerResult<Self> {
        // Single fail-fast check for every required credential (spec §6,
        // §7 ConfigInvalid) before any client touches the network.
        sg_config::Credentials::from_env()
            .map_err(|e| WorkerError::config_invalid(e.to_string()))?;

        let catalog = CatalogClient::from_env().await?;
        let chat = ChatClient::from_env().map_err(WorkerError::Llm)?;
        let heygen = HeyGenClient::from_env().map_err(WorkerError::Client)?;
        let vizard = VizardClient::from_env().map_err(WorkerError::Client)?;
        let cloudinary = CloudinaryClient::from_env().map_err(WorkerError::Client)?;
        let creatomate = CreatomateClient::from_env().map_err(WorkerError::Client)?;
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(sg_clients::ClientError::Http)
            .map_err(WorkerError::Client)?;
        let cache = StepCache::new(format!("{}/cache", config.work_dir), config.app_env);

        Ok(Self {
            config,
            catalog,
            chat,
            heygen,
            vizard,
            cloudinary,
            creatomate,
            http,
            cache,
        })
    }

    /// Run exactly one job to a terminal status. Never returns `Err` for a
    /// step failure — those are recorded on `JobRecord.errors` and the
    /// pipeline stops there (spec §7); `Err` is reserved for failures to
    /// even stand up the job's own infrastructure (log file, temp dir).
    pub async fn run(
        &self,
        filter: Filter,
        template_override: Option<String>,
        cancel: Cancellation,
    ) -> WorkerResult<JobRecord> {
        let mut job = JobRecord::new(filter.clone());
        let log_file = WorkflowLogFile::open(format!("{}/logs", self.config.work_dir), job.workflow_id.clone())?;
        let logger = JobLogger::new(&job.job_id, &log_file);
        let webhook = WebhookEmitter::new(self.config.webhook_base_url.clone(), job.job_id.clone());
        let temp_dir = JobTempDir::create(&self.config.work_dir, job.workflow_id.as_str()).await?;

        logger.log_start(
            "workflow started",
            json!({ "job_id": job.job_id.as_str(), "filter": filter }),
        );
        webhook.step_started(StepName::ConfigValidation.step_number(), StepName::ConfigValidation.display_name());

        if let Err(e) = validate_filter(&filter) {
            logger.log_error("config validation failed", json!({ "error": e.to_string() }));
            webhook.step_failed(StepName::ConfigValidation.step_number(), StepName::ConfigValidation.display_name(), json!({ "error": e.to_string() }));
            job.record_error(ErrorEntry::new(e.to_error_kind(), StepName::ConfigValidation));
            return Ok(job);
        }
        webhook.step_completed(StepName::ConfigValidation.step_number(), StepName::ConfigValidation.display_name(), 0.0, json!({}));

        // Step 1: catalog extraction.
        if cancel.check().is_err() {
            return Ok(cancel_job(job, &logger, &webhook));
        }
        let step_started = Instant::now();
        webhook.step_started(StepName::CatalogExtraction.step_number(), StepName::CatalogExtraction.display_name());
        let movies = match steps::catalog::run(&self.catalog, &filter, &job.workflow_id, &self.cache).await {
            Ok(movies) => movies,
            Err(e) => return Ok(fail_step(job, &logger, &webhook, StepName::CatalogExtraction, e)),
        };
        job.record_timing("catalog_extraction", step_started.elapsed());
        webhook.step_completed(
            StepName::CatalogExtraction.step_number(),
            StepName::CatalogExtraction.display_name(),
            step_started.elapsed().as_secs_f64(),
            json!({ "movie_count": movies.len() }),
        );
        job.movies = Some(movies.clone());

        // Step 2: script generation.
        if cancel.check().is_err() {
            return Ok(cancel_job(job, &logger, &webhook));
        }
        let step_started = Instant::now();
        webhook.step_started(StepName::ScriptGeneration.step_number(), StepName::ScriptGeneration.display_name());
        let (scripts, warnings) = match steps::script::run(
            &self.chat,
            &movies,
            &filter,
            temp_dir.path(),
            &job.workflow_id,
            &self.cache,
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(e) => return Ok(fail_step(job, &logger, &webhook, StepName::ScriptGeneration, e)),
        };
        for warning in warnings {
            logger.log_warning("hook timing unmet", json!({ "detail": warning.kind.message() }));
            job.record_error(warning);
        }
        job.record_timing("script_generation", step_started.elapsed());
        webhook.step_completed(
            StepName::ScriptGeneration.step_number(),
            StepName::ScriptGeneration.display_name(),
            step_started.elapsed().as_secs_f64(),
            json!({}),
        );
        job.scripts = Some(scripts.clone());

        // Step 3: asset preparation.
        if cancel.check().is_err() {
            return Ok(cancel_job(job, &logger, &webhook));
        }
        let step_started = Instant::now();
        webhook.step_started(StepName::AssetPreparation.step_number(), StepName::AssetPreparation.display_name());
        let parallelism = self.config.parallelism_for(movies.len());
        let (assets, asset_warnings) = match steps::assets::run(
            &self.http,
            &self.cloudinary,
            &self.vizard,
            &movies,
            &filter,
            temp_dir.path(),
            parallelism,
            &job.workflow_id,
            &self.cache,
            &cancel,
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(e) => return Ok(fail_step(job, &logger, &webhook, StepName::AssetPreparation, e)),
        };
        for warning in asset_warnings {
            logger.log_warning("scroll video unavailable", json!({ "detail": warning.kind.message() }));
            job.record_error(warning);
        }
        job.record_timing("asset_preparation", step_started.elapsed());
        webhook.step_completed(
            StepName::AssetPreparation.step_number(),
            StepName::AssetPreparation.display_name(),
            step_started.elapsed().as_secs_f64(),
            json!({ "posters": assets.posters.len(), "clips": assets.clips.len(), "scroll_video": assets.scroll_video.is_some() }),
        );
        job.assets = Some(assets.clone());

        // Step 4: avatar video rendering.
        if cancel.check().is_err() {
            return Ok(cancel_job(job, &logger, &webhook));
        }
        let step_started = Instant::now();
        webhook.step_started(StepName::AvatarRendering.step_number(), StepName::AvatarRendering.display_name());
        let avatar_jobs = match steps::avatar::run(
            &self.heygen,
            &movies,
            &scripts,
            template_override.as_deref(),
            parallelism,
            &job.workflow_id,
            &self.cache,
            &cancel,
        )
        .await
        {
            Ok(jobs) => jobs,
            Err(e) => return Ok(fail_step(job, &logger, &webhook, StepName::AvatarRendering, e)),
        };
        job.record_timing("avatar_rendering", step_started.elapsed());
        webhook.step_completed(
            StepName::AvatarRendering.step_number(),
            StepName::AvatarRendering.display_name(),
            step_started.elapsed().as_secs_f64(),
            json!({ "jobs": avatar_jobs.len() }),
        );
        job.avatar_jobs = Some(avatar_jobs.clone());

        // Step 5: script-video URL resolution.
        if cancel.check().is_err() {
            return Ok(cancel_job(job, &logger, &webhook));
        }
        let step_started = Instant::now();
        webhook.step_started(StepName::UrlResolution.step_number(), StepName::UrlResolution.display_name());
        let avatar_urls = match steps::resolve::run(&self.http, &avatar_jobs, parallelism).await {
            Ok(urls) => urls,
            Err(e) => return Ok(fail_step(job, &logger, &webhook, StepName::UrlResolution, e)),
        };
        job.record_timing("url_resolution", step_started.elapsed());
        webhook.step_completed(
            StepName::UrlResolution.step_number(),
            StepName::UrlResolution.display_name(),
            step_started.elapsed().as_secs_f64(),
            json!({}),
        );
        job.avatar_urls = Some(avatar_urls.clone());

        // Step 6: composition building.
        if cancel.check().is_err() {
            return Ok(cancel_job(job, &logger, &webhook));
        }
        let step_started = Instant::now();
        webhook.step_started(StepName::Composition.step_number(), StepName::Composition.display_name());
        let composition = match steps::composition::run(
            &self.http,
            &movies,
            &scripts,
            &assets,
            &avatar_urls,
            temp_dir.path(),
            self.config.poster_strategy,
            parallelism,
        )
        .await
        {
            Ok(composition) => composition,
            Err(e) => return Ok(fail_step(job, &logger, &webhook, StepName::Composition, e)),
        };
        job.record_timing("composition", step_started.elapsed());
        webhook.step_completed(
            StepName::Composition.step_number(),
            StepName::Composition.display_name(),
            step_started.elapsed().as_secs_f64(),
            json!({ "elements": composition.elements.len() }),
        );

        // Step 7: render handoff. No cancellation check after this point:
        // the submission is a single request, not a poll loop, and it's
        // the job's entire purpose, so we let it finish.
        let step_started = Instant::now();
        webhook.step_started(StepName::RenderHandoff.step_number(), StepName::RenderHandoff.display_name());
        let render_id = match steps::render::run(&self.creatomate, &composition).await {
            Ok(render_id) => render_id,
            Err(e) => return Ok(fail_step(job, &logger, &webhook, StepName::RenderHandoff, e)),
        };
        job.record_timing("render_handoff", step_started.elapsed());
        job.composition_id = Some(render_id.clone());
        webhook.creatomate_ready(&render_id);

        if job.status == sg_models::JobStatus::Running {
            job.status = sg_models::JobStatus::Completed;
        }
        logger.log_completion(
            "workflow completed",
            json!({ "render_id": render_id, "step_timings": job.step_timings }),
        );

        Ok(job)
    }
}

fn validate_filter(filter: &Filter) -> Result<(), WorkerError> {
    if filter.num_movies == 0 || filter.num_movies > 20 {
        return Err(WorkerError::config_invalid(format!(
            "num_movies must be in 1..=20, got {}",
            filter.num_movies
        )));
    }
    if filter.country.trim().is_empty() || filter.platform.trim().is_empty() || filter.genre.trim().is_empty() {
        return Err(WorkerError::config_invalid("country, platform and genre must be non-empty"));
    }
    // spec §3: every string field must resolve through the §6 mapping
    // tables or the job fails fast as ConfigInvalid, before step 1.
    if sg_config::resolve_genre(&filter.genre).is_none() {
        return Err(WorkerError::config_invalid(format!("unknown genre: {}", filter.genre)));
    }
    if sg_config::resolve_platform(&filter.platform).is_none() {
        return Err(WorkerError::config_invalid(format!("unknown platform: {}", filter.platform)));
    }
    if sg_config::resolve_content_type(&filter.content_type).is_none() {
        return Err(WorkerError::config_invalid(format!(
            "unknown content_type: {}",
            filter.content_type
        )));
    }
    Ok(())
}

fn fail_step(
    mut job: JobRecord,
    logger: &JobLogger<'_>,
    webhook: &WebhookEmitter,
    step: StepName,
    error: WorkerError,
) -> JobRecord {
    warn!("step {} failed: {error}", step.display_name());
    logger.log_error(&format!("{} failed", step.display_name()), json!({ "error": error.to_string() }));
    webhook.step_failed(step.step_number(), step.display_name(), json!({ "error": error.to_string() }));
    job.record_error(ErrorEntry::new(error.to_error_kind(), step));
    job
}

fn cancel_job(mut job: JobRecord, logger: &JobLogger<'_>, webhook: &WebhookEmitter) -> JobRecord {
    info!("job {} cancelled", job.job_id);
    logger.log_error("workflow cancelled", json!({}));
    webhook.step_failed(0, "Cancelled", json!({}));
    job.record_error(ErrorEntry::new(
        ErrorKind::ConfigInvalid("job cancelled".to_string()),
        StepName::ConfigValidation,
    ));
    job
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_movies() {
        let filter = Filter::new("US", "Netflix", "Horror", "Film", 0);
        assert!(validate_filter(&filter).is_err());
    }

    #[test]
    fn rejects_more_than_twenty_movies() {
        let filter = Filter::new("US", "Netflix", "Horror", "Film", 21);
        assert!(validate_filter(&filter).is_err());
    }

    #[test]
    fn accepts_single_movie_boundary() {
        // spec §8 boundary: num_movies = 1 must be a legal job.
        let filter = Filter::new("US", "Netflix", "Horror", "Film", 1);
        assert!(validate_filter(&filter).is_ok());
    }

    #[test]
    fn rejects_blank_country_platform_or_genre() {
        assert!(validate_filter(&Filter::new("", "Netflix", "Horror", "Film", 3)).is_err());
        assert!(validate_filter(&Filter::new("US", "", "Horror", "Film", 3)).is_err());
        assert!(validate_filter(&Filter::new("US", "Netflix", "", "Film", 3)).is_err());
    }

    #[test]
    fn rejects_genre_platform_or_content_type_unresolvable_through_mapping_tables() {
        assert!(validate_filter(&Filter::new("US", "Netflix", "Zombie", "Film", 3)).is_err());
        assert!(validate_filter(&Filter::new("US", "Peacock", "Horror", "Film", 3)).is_err());
        assert!(validate_filter(&Filter::new("US", "Netflix", "Horror", "Podcast", 3)).is_err());
    }

    #[test]
    fn accepts_filter_whose_fields_all_resolve() {
        assert!(validate_filter(&Filter::new("US", "Netflix", "Horror", "Film", 3)).is_ok());
    }

    #[test]
    fn fail_step_records_a_fatal_error_and_fails_the_job() {
        let filter = Filter::new("US", "Netflix", "Horror", "Film", 3);
        let job = JobRecord::new(filter.clone());
        let log_dir = tempfile::tempdir().unwrap();
        let log_file = WorkflowLogFile::open(log_dir.path().to_string_lossy().to_string(), job.workflow_id.clone()).unwrap();
        let logger = JobLogger::new(&job.job_id, &log_file);
        let webhook = WebhookEmitter::new(None, job.job_id.clone());

        let failed = fail_step(
            job,
            &logger,
            &webhook,
            StepName::CatalogExtraction,
            WorkerError::config_invalid("unknown genre"),
        );
        assert_eq!(failed.status, sg_models::JobStatus::Failed);
        assert_eq!(failed.errors.len(), 1);
    }
}
