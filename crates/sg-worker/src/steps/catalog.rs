//! Step 1: catalog extraction (spec §4.1).

use sg_cache::StepCache;
use sg_catalog::CatalogClient;
use sg_models::{Movie, WorkflowId};
use tracing::info;

use crate::error::{WorkerError, WorkerResult};
use sg_models::Filter;

const CACHE_KEY: &str = "catalog";

/// Return exactly `filter.num_movies` movies, ranked by `imdb_score`
/// descending (spec §4.1 postcondition). Consults the dev-mode cache
/// first; writes the fresh result back regardless of whether the read
/// hit, so a `local`-mode rerun can still refresh the cache (spec §9).
pub async fn run(
    catalog: &CatalogClient,
    filter: &Filter,
    workflow_id: &WorkflowId,
    cache: &StepCache,
) -> WorkerResult<Vec<Movie>> {
    if let Some(cached) = cache.read::<Vec<Movie>>(workflow_id, CACHE_KEY).await {
        info!("catalog extraction served from cache ({} movies)", cached.len());
        return Ok(cached);
    }

    let movies = catalog.extract(filter).await.map_err(WorkerError::Catalog)?;

    debug_assert_eq!(movies.len(), filter.num_movies as usize);
    cache.write(workflow_id, CACHE_KEY, &movies).await.ok();

    Ok(movies)
}
