//! Shared value types passed between the StreamGank orchestrator's steps.
//!
//! Every type here is plain data: construction and validation live in the
//! crates that own each step (`sg-catalog`, `sg-llm`, `sg-clients`, ...).

pub mod asset;
pub mod avatar;
pub mod composition;
pub mod error;
pub mod filter;
pub mod ids;
pub mod job;
pub mod movie;
pub mod progress;
pub mod script;

pub use asset::AssetBundle;
pub use avatar::{estimate_duration_minutes, AvatarJob, AvatarJobStatus};
pub use composition::{Composition, CompositionElement, PosterStrategy};
pub use error::{ErrorEntry, ErrorKind, StepName};
pub use filter::Filter;
pub use ids::{JobId, WorkflowId};
pub use job::{AppEnv, JobRecord, JobStatus};
pub use movie::Movie;
pub use progress::{ProgressEvent, ProgressStatus};
pub use script::ScriptBundle;
