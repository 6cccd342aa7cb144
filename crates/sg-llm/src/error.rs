//! Script-generator errors (spec §4.2 / §7).

use thiserror::Error;

pub type LlmResult<T> = Result<T, LlmError>;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Transport(String),

    #[error("LLM returned a non-success status {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("content-policy rejection for hook: {0}")]
    ContentRejected(String),

    #[error("script generation failed: {0}")]
    GenerationFailed(String),

    #[error("failed to parse LLM response: {0}")]
    MalformedResponse(String),

    #[error("io error persisting scripts: {0}")]
    Io(#[from] std::io::Error),
}

impl LlmError {
    /// Transport-layer errors (5xx, timeouts, connection resets) are
    /// retried with backoff; content-policy and malformed-response
    /// errors are not (spec §4.2 failure semantics).
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::Transport(_) | LlmError::BadStatus { .. })
    }
}
