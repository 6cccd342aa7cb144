//! Workflow orchestrator binary.
//!
//! Invoked once per job by an external API server (out of scope for this
//! core, spec §1): reads a `Filter` as JSON from stdin, runs it through all
//! seven steps to a terminal status, and prints the resulting `JobRecord` as
//! JSON on stdout. There is no queue-consumer loop here: the orchestrator
//! runs per-job, and concurrency across jobs is the API server's concern
//! (spec §2).

use std::io::Read;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sg_config::WorkerConfig;
use sg_models::Filter;
use sg_worker::{Cancellation, Orchestrator};

/// Optional stdin envelope: the bare filter, or the filter plus a per-job
/// template-id override (spec §4.4.2: "the job accepts an override
/// template ID as input").
#[derive(serde::Deserialize)]
struct JobInput {
    #[serde(flatten)]
    filter: Filter,
    #[serde(default)]
    template_id: Option<String>,
}

#[tokio::main]
async fn main() {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("failed to install rustls crypto provider");

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(EnvFilter::from_default_env().add_directive("sg_worker=info".parse().unwrap()))
        .init();

    info!("starting sg-worker");

    let config = WorkerConfig::from_env();
    info!(?config, "worker config loaded");

    let input = match read_job_input() {
        Ok(input) => input,
        Err(e) => {
            error!("failed to read job input from stdin: {e}");
            std::process::exit(1);
        }
    };

    let orchestrator = match Orchestrator::new(config).await {
        Ok(o) => o,
        Err(e) => {
            error!("failed to construct orchestrator: {e}");
            std::process::exit(1);
        }
    };

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let shutdown_handle = tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal");
        shutdown_tx.send(true).ok();
    });

    let cancel = Cancellation::new(shutdown_rx);
    let job = match orchestrator.run(input.filter, input.template_id, cancel).await {
        Ok(job) => job,
        Err(e) => {
            error!("orchestrator run failed: {e}");
            std::process::exit(1);
        }
    };

    let exit_code = if job.status == sg_models::JobStatus::Failed { 1 } else { 0 };
    match serde_json::to_string(&job) {
        Ok(json) => println!("{json}"),
        Err(e) => error!("failed to serialize job record: {e}"),
    }

    shutdown_handle.abort();
    info!("sg-worker shutdown complete");
    std::process::exit(exit_code);
}

fn read_job_input() -> anyhow::Result<JobInput> {
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    let input: JobInput = serde_json::from_str(&buf)?;
    Ok(input)
}
