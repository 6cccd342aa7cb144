//! Script generation: step 2 of the StreamGank pipeline (spec §4.2).
//!
//! Produces one intro and N hook scripts via an LLM, applying the
//! intro-integration invariant and a bounded, timing-aware retry loop for
//! hooks K>1.

pub mod client;
pub mod error;
pub mod generator;
pub mod retry;
pub mod sanitize;

pub use client::{ChatClient, CompletionParams};
pub use error::{LlmError, LlmResult};
pub use generator::{persist_scripts, GenerationWarning, ScriptGenerator, ACCEPT_MAX_WORDS, ACCEPT_MIN_WORDS};
