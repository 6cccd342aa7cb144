//! Env-driven runtime configuration, following a
//! `std::env::var(...).ok().and_then(...).unwrap_or(default)` pattern
//! for every field.

use std::time::Duration;

use sg_models::{job::AppEnv, PosterStrategy};

/// Required credentials and endpoints pulled from the environment (spec §6).
#[derive(Debug, Clone)]
pub struct Credentials {
    pub openai_api_key: String,
    pub heygen_api_key: String,
    pub vizard_api_key: String,
    pub creatomate_api_key: String,
    pub cloudinary_cloud_name: String,
    pub cloudinary_api_key: String,
    pub cloudinary_api_secret: String,
    pub supabase_url: String,
    pub supabase_key: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),
}

impl Credentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        fn required(name: &'static str) -> Result<String, ConfigError> {
            std::env::var(name).map_err(|_| ConfigError::MissingVar(name))
        }

        Ok(Self {
            openai_api_key: required("OPENAI_API_KEY")?,
            heygen_api_key: required("HEYGEN_API_KEY")?,
            vizard_api_key: required("VIZARD_API_KEY")?,
            creatomate_api_key: required("CREATOMATE_API_KEY")?,
            cloudinary_cloud_name: required("CLOUDINARY_CLOUD_NAME")?,
            cloudinary_api_key: required("CLOUDINARY_API_KEY")?,
            cloudinary_api_secret: required("CLOUDINARY_API_SECRET")?,
            supabase_url: required("SUPABASE_URL")?,
            supabase_key: required("SUPABASE_KEY")?,
        })
    }
}

/// Tunable orchestrator behavior, all overridable via env vars with
/// sensible defaults — nothing here is required for the job to run.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Webhook base URL; progress emission becomes a no-op (log-only) if unset.
    pub webhook_base_url: Option<String>,
    pub app_env: AppEnv,
    /// Pre-assigned job id, e.g. set by the enqueuing API server.
    pub job_id: Option<String>,
    pub poster_strategy: PosterStrategy,
    /// Bound on parallel sub-tasks within steps 3/4 (spec §5: `min(N, 8)`).
    pub max_parallel: usize,
    pub http_timeout: Duration,
    pub upload_timeout: Duration,
    pub webhook_timeout: Duration,
    pub clip_extraction_timeout: Duration,
    pub work_dir: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            webhook_base_url: None,
            app_env: AppEnv::Dev,
            job_id: None,
            poster_strategy: PosterStrategy::HeygenLast3s,
            max_parallel: 8,
            http_timeout: Duration::from_secs(30),
            upload_timeout: Duration::from_secs(60),
            webhook_timeout: Duration::from_secs(5),
            clip_extraction_timeout: Duration::from_secs(20 * 60),
            work_dir: "/tmp/streamgank".to_string(),
        }
    }
}

impl WorkerConfig {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            webhook_base_url: std::env::var("WEBHOOK_BASE_URL").ok(),
            app_env: std::env::var("APP_ENV")
                .map(|s| AppEnv::from_env_str(&s))
                .unwrap_or_default(),
            job_id: std::env::var("JOB_ID").ok(),
            poster_strategy: std::env::var("POSTER_STRATEGY")
                .ok()
                .and_then(|s| match s.to_lowercase().as_str() {
                    "between_clips" => Some(PosterStrategy::BetweenClips),
                    "heygen_last3s" => Some(PosterStrategy::HeygenLast3s),
                    _ => None,
                })
                .unwrap_or(default.poster_strategy),
            max_parallel: std::env::var("SG_MAX_PARALLEL")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.max_parallel),
            http_timeout: Duration::from_secs(
                std::env::var("SG_HTTP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            upload_timeout: Duration::from_secs(
                std::env::var("SG_UPLOAD_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            webhook_timeout: Duration::from_secs(
                std::env::var("SG_WEBHOOK_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            clip_extraction_timeout: Duration::from_secs(
                std::env::var("SG_CLIP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(20 * 60),
            ),
            work_dir: std::env::var("SG_WORK_DIR").unwrap_or(default.work_dir),
        }
    }

    /// `min(N, 8)` worker bound from spec §5.
    pub fn parallelism_for(&self, n: usize) -> usize {
        n.min(self.max_parallel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_timeouts() {
        let cfg = WorkerConfig::default();
        assert_eq!(cfg.http_timeout, Duration::from_secs(30));
        assert_eq!(cfg.upload_timeout, Duration::from_secs(60));
        assert_eq!(cfg.webhook_timeout, Duration::from_secs(5));
        assert_eq!(cfg.clip_extraction_timeout, Duration::from_secs(1200));
    }

    #[test]
    fn parallelism_is_bounded_by_eight() {
        let cfg = WorkerConfig::default();
        assert_eq!(cfg.parallelism_for(3), 3);
        assert_eq!(cfg.parallelism_for(20), 8);
    }
}
