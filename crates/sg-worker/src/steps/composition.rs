//! Step 6: composition building (spec §4.6, §4.8).
//!
//! Probes each resolved avatar URL's real duration in parallel before
//! handing everything to `sg_composition::build`; a probe failure falls
//! back to the character-count estimate rather than failing the step
//! (spec §4.8: the estimate exists precisely for this case).

use std::collections::BTreeMap;
use std::path::Path;

use futures_util::{stream, StreamExt};
use reqwest::Client;
use tracing::warn;

use sg_media::probe::{estimate_duration_from_chars, probe_remote_duration};
use sg_models::{AssetBundle, Composition, Movie, PosterStrategy, ScriptBundle};

use crate::error::WorkerResult;

/// Resolve every slot's avatar-video duration, then build the Creatomate
/// timeline document.
pub async fn run(
    http: &Client,
    movies: &[Movie],
    scripts: &ScriptBundle,
    assets: &AssetBundle,
    avatar_urls: &BTreeMap<String, String>,
    scratch_dir: &Path,
    strategy: PosterStrategy,
    parallelism: usize,
) -> WorkerResult<Composition> {
    let durations: Vec<(String, f64)> = stream::iter(avatar_urls.iter())
        .map(|(slot, url)| async move {
            let duration = match probe_remote_duration(http, url, scratch_dir).await {
                Ok(d) if d > 0.0 => d,
                Ok(_) | Err(_) => {
                    let chars = scripts.individual.get(slot).map(|s| s.chars().count()).unwrap_or(0);
                    let estimate = estimate_duration_from_chars(chars);
                    warn!("avatar duration probe failed for slot {slot}, using estimate {estimate:.1}s");
                    estimate
                }
            };
            (slot.clone(), duration)
        })
        .buffer_unordered(parallelism)
        .collect()
        .await;

    let avatar_durations: BTreeMap<String, f64> = durations.into_iter().collect();

    let composition = sg_composition::build(movies, scripts, assets, avatar_urls, &avatar_durations, strategy)?;
    Ok(composition)
}
