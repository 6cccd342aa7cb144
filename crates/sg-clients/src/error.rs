//! Shared error type for the four external HTTP clients (spec §4.3/§4.4/§4.7).

use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("returned {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("{0} timed out")]
    Timeout(String),

    #[error("{0} job failed remotely: {1}")]
    RemoteFailure(String, String),

    #[error("{0}")]
    Other(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn bad_status(status: u16, body: impl Into<String>) -> Self {
        Self::BadStatus {
            status,
            body: body.into(),
        }
    }

    pub fn timeout(what: impl Into<String>) -> Self {
        Self::Timeout(what.into())
    }

    pub fn remote_failure(what: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::RemoteFailure(what.into(), detail.into())
    }

    /// Transport failures, 5xx, and 429 rate-limits are retried locally
    /// with backoff (spec §7); any other 4xx is a non-recoverable rejection
    /// (e.g. Creatomate's 400 on a malformed composition, spec §7
    /// `CompositionSubmissionFailed`) and must not be retried as if it were
    /// transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport(_) | ClientError::Http(_) => true,
            ClientError::BadStatus { status, .. } => *status == 429 || *status >= 500,
            ClientError::Timeout(_) | ClientError::RemoteFailure(_, _) | ClientError::Other(_) | ClientError::Io(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_and_rate_limits_are_retryable() {
        assert!(ClientError::bad_status(500, "").is_retryable());
        assert!(ClientError::bad_status(503, "").is_retryable());
        assert!(ClientError::bad_status(429, "").is_retryable());
    }

    #[test]
    fn client_rejections_are_terminal() {
        assert!(!ClientError::bad_status(400, "").is_retryable());
        assert!(!ClientError::bad_status(404, "").is_retryable());
        assert!(!ClientError::timeout("heygen poll").is_retryable());
    }
}
