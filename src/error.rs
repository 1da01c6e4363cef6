use crate::transport::TransportError;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum SnowError {
    /// Timeout, connection failure or other transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// Non-success HTTP status code with raw response body.
    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },
    /// Response body is not JSON or the record envelope has an unexpected shape.
    #[error("decode error: {0}")]
    Decode(String),
    /// Invalid options, endpoint or missing environment.
    #[error("config error: {0}")]
    Config(String),
    /// The retry loop finished without a response and without a recorded error.
    #[error("request loop ended without any attempt (max_attempts is 0)")]
    NoAttempts,
}

impl SnowError {
    /// Returns `true` for failures the session retries: gateway statuses
    /// (502, 503, 504), timeouts and connection failures.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(err) => err.is_retryable(),
            Self::Http { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub(crate) fn is_retryable_status(status: u16) -> bool {
    matches!(status, 502..=504)
}
