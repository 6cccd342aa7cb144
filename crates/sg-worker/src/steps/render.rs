//! Step 7: render handoff (spec §4.7).
//!
//! Submits the composition and returns immediately with the render id —
//! the pipeline does not block on Creatomate finishing (spec §1 Non-goal:
//! "waiting for the final render").

use sg_clients::CreatomateClient;
use sg_models::Composition;

use crate::error::WorkerResult;

pub async fn run(creatomate: &CreatomateClient, composition: &Composition) -> WorkerResult<String> {
    let document = composition.to_json();
    let render_id = creatomate.submit_render(&document).await?;
    Ok(render_id)
}
