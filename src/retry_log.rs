//! Retry diagnostics.
//!
//! The session reports every retryable failure to a [`RetryLog`] before it
//! sleeps. The default implementation forwards to `tracing`.

use std::time::Duration;

use crate::{SnowError, Verb};

/// One retryable failure observed by the session.
#[derive(Debug)]
pub struct RetryAttempt<'a> {
    pub verb: Verb,
    pub url: &'a str,
    /// Zero-based attempt number that failed.
    pub attempt: usize,
    pub error: &'a SnowError,
    /// Backoff the session is about to sleep.
    pub delay: Duration,
}

/// Sink for retry diagnostics.
pub trait RetryLog: Send + Sync {
    fn log_retry(&self, attempt: &RetryAttempt<'_>);
}

/// Emits one `warn` event per retry.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingRetryLog;

impl RetryLog for TracingRetryLog {
    fn log_retry(&self, attempt: &RetryAttempt<'_>) {
        tracing::warn!(
            verb = %attempt.verb,
            url = attempt.url,
            attempt = attempt.attempt,
            delay_ms = attempt.delay.as_millis() as u64,
            error = %attempt.error,
            "request failed, backing off before retry"
        );
    }
}
