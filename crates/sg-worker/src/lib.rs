//! StreamGank workflow orchestrator: the seven-step pipeline (spec §2).
//!
//! This crate provides:
//! - The `Orchestrator`, owning every external client and driving one job
//!   through all seven steps to a terminal status
//! - Per-step implementations under `steps`
//! - Cooperative cancellation
//! - Structured per-job logging
//! - Scoped per-job temp-directory cleanup

pub mod cancel;
pub mod error;
pub mod logging;
pub mod steps;
pub mod tempdir;
pub mod workflow;

pub use cancel::Cancellation;
pub use error::{WorkerError, WorkerResult};
pub use logging::JobLogger;
pub use tempdir::JobTempDir;
pub use workflow::Orchestrator;
