use std::time::Duration;

use crate::{Result, SnowError};

/// Configures HTTP timeout and retry behavior of a [`Session`](crate::Session).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionOptions {
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Total number of attempts per call, including the first one.
    pub max_attempts: usize,
    /// Delay slept after the first retryable failure, in milliseconds.
    pub retry_delay_ms: u64,
    /// Factor applied to the delay after every retryable failure.
    pub backoff_multiplier: u32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_attempts: 3,
            retry_delay_ms: 3_000,
            backoff_multiplier: 2,
        }
    }
}

impl SessionOptions {
    /// Reads options from the environment, falling back to defaults.
    ///
    /// Reads (all optional):
    /// - `SNOW_TIMEOUT_MS`
    /// - `SNOW_MAX_ATTEMPTS`
    /// - `SNOW_RETRY_DELAY_MS`
    /// - `SNOW_RETRY_BACKOFF`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            timeout_ms: parse_var(&lookup, "SNOW_TIMEOUT_MS")?.unwrap_or(defaults.timeout_ms),
            max_attempts: parse_var(&lookup, "SNOW_MAX_ATTEMPTS")?
                .unwrap_or(defaults.max_attempts),
            retry_delay_ms: parse_var(&lookup, "SNOW_RETRY_DELAY_MS")?
                .unwrap_or(defaults.retry_delay_ms),
            backoff_multiplier: parse_var(&lookup, "SNOW_RETRY_BACKOFF")?
                .unwrap_or(defaults.backoff_multiplier),
        })
    }

    pub(crate) fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Delay slept after the `failures`-th consecutive retryable failure
    /// (zero-based): `retry_delay_ms * backoff_multiplier^failures`.
    pub fn delay_for(&self, failures: usize) -> Duration {
        let exp = u32::try_from(failures).unwrap_or(u32::MAX);
        let factor = u64::from(self.backoff_multiplier).saturating_pow(exp);
        Duration::from_millis(self.retry_delay_ms.saturating_mul(factor))
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|err| SnowError::Config(format!("invalid {key} '{raw}': {err}"))),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::{SessionOptions, SnowError};

    #[test]
    fn defaults_match_platform_recommendation() {
        let opts = SessionOptions::default();
        assert_eq!(opts.max_attempts, 3);
        assert_eq!(opts.retry_delay_ms, 3_000);
        assert_eq!(opts.backoff_multiplier, 2);
    }

    #[test]
    fn delay_grows_geometrically() {
        let opts = SessionOptions::default();
        let total: Duration = (0..3).map(|n| opts.delay_for(n)).sum();
        assert_eq!(opts.delay_for(0), Duration::from_secs(3));
        assert_eq!(opts.delay_for(2), Duration::from_secs(12));
        assert_eq!(total, Duration::from_secs(21));
    }

    #[test]
    fn delay_saturates_instead_of_overflowing() {
        let opts = SessionOptions::default();
        assert_eq!(opts.delay_for(200), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn from_lookup_overrides_and_defaults() {
        let opts = SessionOptions::from_lookup(|key| match key {
            "SNOW_MAX_ATTEMPTS" => Some("5".to_owned()),
            "SNOW_RETRY_DELAY_MS" => Some(" 10 ".to_owned()),
            "SNOW_TIMEOUT_MS" => Some(String::new()),
            _ => None,
        })
        .expect("must parse");

        assert_eq!(opts.max_attempts, 5);
        assert_eq!(opts.retry_delay_ms, 10);
        assert_eq!(opts.timeout_ms, SessionOptions::default().timeout_ms);
        assert_eq!(opts.backoff_multiplier, 2);
    }

    #[test]
    fn from_lookup_rejects_garbage() {
        let err = SessionOptions::from_lookup(|key| {
            (key == "SNOW_RETRY_BACKOFF").then(|| "twice".to_owned())
        })
        .expect_err("must fail");
        assert!(matches!(err, SnowError::Config(msg) if msg.contains("SNOW_RETRY_BACKOFF")));
    }
}
