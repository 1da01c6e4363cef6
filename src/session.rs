use std::fmt;
use std::sync::Arc;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use tokio::time::sleep;

use crate::{
    retry_log::{RetryAttempt, RetryLog, TracingRetryLog},
    transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, Verb},
    Result, SessionOptions, SnowError,
};

/// Basic-auth credentials attached to every request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Reads `SNOW_USER` and `SNOW_PASSWORD`.
    ///
    /// Returns an error if either variable is missing or empty.
    pub fn from_env() -> Result<Self> {
        Ok(Self::basic(
            required_env("SNOW_USER")?,
            required_env("SNOW_PASSWORD")?,
        ))
    }
}

pub(crate) fn required_env(key: &str) -> Result<String> {
    let value = std::env::var(key)
        .map_err(|_| SnowError::Config(format!("missing {key} environment variable")))?;
    if value.trim().is_empty() {
        return Err(SnowError::Config(format!("{key} is set but empty")));
    }
    Ok(value)
}

/// Per-call request parts: query pairs, JSON body and header overrides.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub headers: HeaderMap,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets a header for this call only, replacing any session default.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// HTTP session that retries transient failures with exponential backoff.
///
/// Gateway statuses (502, 503, 504), timeouts and connection failures are
/// retried up to [`SessionOptions::max_attempts`] times in total. Any other
/// non-2xx status is returned immediately as [`SnowError::Http`].
#[derive(Clone)]
pub struct Session<T = ReqwestTransport> {
    transport: T,
    headers: HeaderMap,
    credentials: Option<Credentials>,
    options: SessionOptions,
    retry_log: Arc<dyn RetryLog>,
}

impl<T> fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("headers", &self.headers)
            .field("credentials", &self.credentials)
            .field("options", &self.options)
            .finish()
    }
}

impl Session<ReqwestTransport> {
    /// Creates a session over a `reqwest` transport.
    pub fn new(credentials: Credentials) -> Result<Self> {
        Ok(Self::with_transport(ReqwestTransport::new()?, credentials))
    }

    /// Creates a session from `SNOW_USER`, `SNOW_PASSWORD` and the optional
    /// `SNOW_*` retry variables read by [`SessionOptions::from_env`].
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(Credentials::from_env()?)?.with_options(SessionOptions::from_env()?))
    }
}

impl<T: Transport> Session<T> {
    /// Creates a session over any [`Transport`].
    pub fn with_transport(transport: T, credentials: Credentials) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        Self {
            transport,
            headers,
            credentials: Some(credentials),
            options: SessionOptions::default(),
            retry_log: Arc::new(TracingRetryLog),
        }
    }

    /// Applies timeout and retry options.
    pub fn with_options(mut self, opts: SessionOptions) -> Self {
        self.options = opts;
        self
    }

    /// Replaces the sink that receives one event per retry.
    pub fn with_retry_log(mut self, retry_log: Arc<dyn RetryLog>) -> Self {
        self.retry_log = retry_log;
        self
    }

    /// Adds or replaces a default header sent with every request.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn head(&self, url: &str, options: RequestOptions) -> Result<HttpResponse> {
        self.send(Verb::Head, url, options).await
    }

    pub async fn get(&self, url: &str, options: RequestOptions) -> Result<HttpResponse> {
        self.send(Verb::Get, url, options).await
    }

    pub async fn post(&self, url: &str, options: RequestOptions) -> Result<HttpResponse> {
        self.send(Verb::Post, url, options).await
    }

    pub async fn put(&self, url: &str, options: RequestOptions) -> Result<HttpResponse> {
        self.send(Verb::Put, url, options).await
    }

    pub async fn patch(&self, url: &str, options: RequestOptions) -> Result<HttpResponse> {
        self.send(Verb::Patch, url, options).await
    }

    pub async fn delete(&self, url: &str, options: RequestOptions) -> Result<HttpResponse> {
        self.send(Verb::Delete, url, options).await
    }

    /// Issues `verb` against `url`, retrying transient failures.
    ///
    /// After every retryable failure, including the last one, the session
    /// logs the failure and sleeps `retry_delay_ms * backoff_multiplier^n`.
    /// When all attempts fail the last retryable error is returned.
    pub async fn send(&self, verb: Verb, url: &str, options: RequestOptions) -> Result<HttpResponse> {
        let request = self.build_request(verb, url, options);
        let mut last_error: Option<SnowError> = None;
        let mut attempt = 0usize;

        while attempt < self.options.max_attempts {
            let error = match self.transport.send(request.clone()).await {
                Ok(response) if response.is_success() => return Ok(response),
                Ok(response) => SnowError::Http {
                    status: response.status,
                    body: response.body,
                },
                Err(err) => SnowError::Transport(err),
            };

            if !error.is_retryable() {
                tracing::debug!(verb = %verb, url, attempt, error = %error, "request failed");
                return Err(error);
            }

            let delay = self.options.delay_for(attempt);
            self.retry_log.log_retry(&RetryAttempt {
                verb,
                url,
                attempt,
                error: &error,
                delay,
            });
            last_error = Some(error);
            attempt += 1;
            sleep(delay).await;
        }

        Err(last_error.unwrap_or(SnowError::NoAttempts))
    }

    fn build_request(&self, verb: Verb, url: &str, options: RequestOptions) -> HttpRequest {
        let mut headers = self.headers.clone();
        for (name, value) in &options.headers {
            headers.insert(name.clone(), value.clone());
        }

        HttpRequest {
            verb,
            url: url.to_owned(),
            headers,
            query: options.query,
            body: options.body,
            credentials: self.credentials.clone(),
            timeout: self.options.timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::{self, HeaderValue};

    use super::{Credentials, RequestOptions, Session};
    use crate::{
        transport::{HttpRequest, HttpResponse, Transport, TransportError},
        Verb,
    };

    struct Unreachable;

    impl Transport for Unreachable {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
            Err(TransportError::Other("unreachable".to_owned()))
        }
    }

    #[test]
    fn debug_redacts_password() {
        let session = Session::with_transport(Unreachable, Credentials::basic("admin", "hunter2"));
        let debug = format!("{session:?}");
        assert!(debug.contains("admin"));
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn call_headers_override_defaults() {
        let session = Session::with_transport(Unreachable, Credentials::basic("a", "b"));
        let request = session.build_request(
            Verb::Get,
            "https://x/incident.do",
            RequestOptions::new()
                .query("sysparm_action", "get")
                .header(header::ACCEPT, HeaderValue::from_static("text/plain")),
        );

        assert_eq!(request.headers[header::ACCEPT], "text/plain");
        assert_eq!(request.headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(request.query, vec![("sysparm_action".to_owned(), "get".to_owned())]);
        assert_eq!(request.credentials, Some(Credentials::basic("a", "b")));
    }
}
