use std::fmt;
use std::future::Future;
use std::time::Duration;

use reqwest::{header::HeaderMap, redirect, Method};
use serde::de::DeserializeOwned;

use crate::{Credentials, Result, SnowError};

/// HTTP verbs supported by [`Session`](crate::Session).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Verb {
    Head,
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Head => "HEAD",
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    pub(crate) fn method(self) -> Method {
        match self {
            Self::Head => Method::HEAD,
            Self::Get => Method::GET,
            Self::Post => Method::POST,
            Self::Put => Method::PUT,
            Self::Patch => Method::PATCH,
            Self::Delete => Method::DELETE,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single fully-resolved request, replayed verbatim on every attempt.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub verb: Verb,
    pub url: String,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub credentials: Option<Credentials>,
    pub timeout: Duration,
}

/// Status code and raw body of a transport response.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|err| {
            SnowError::Decode(format!("invalid response JSON: {err}; body: {}", self.body))
        })
    }
}

/// Failure raised by a [`Transport`] before any HTTP status was received.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Connect(_))
    }
}

/// Capability the session retries over: send one request, get one response.
///
/// Non-2xx statuses are returned as `Ok` responses; classification is the
/// session's job.
pub trait Transport {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = std::result::Result<HttpResponse, TransportError>> + Send;
}

/// [`Transport`] backed by `reqwest`.
///
/// Redirects are not followed so that login redirects surface as 3xx.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|err| SnowError::Config(format!("cannot build http client: {err}")))?;
        Ok(Self { http })
    }

    /// Wraps an already configured `reqwest` client.
    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: HttpRequest,
    ) -> std::result::Result<HttpResponse, TransportError> {
        let mut builder = self
            .http
            .request(request.verb.method(), &request.url)
            .headers(request.headers)
            .timeout(request.timeout);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(credentials) = &request.credentials {
            builder = builder.basic_auth(&credentials.username, Some(&credentials.password));
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(classify_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify_reqwest_error)?;
        Ok(HttpResponse { status, body })
    }
}

fn classify_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_connect() || err.is_request() || err.is_body() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Method;

    use super::{HttpResponse, Verb};

    #[test]
    fn verb_maps_to_method() {
        let pairs = [
            (Verb::Head, Method::HEAD),
            (Verb::Get, Method::GET),
            (Verb::Post, Method::POST),
            (Verb::Put, Method::PUT),
            (Verb::Patch, Method::PATCH),
            (Verb::Delete, Method::DELETE),
        ];
        for (verb, method) in pairs {
            assert_eq!(verb.method(), method);
            assert_eq!(verb.as_str(), method.as_str());
        }
    }

    #[test]
    fn any_2xx_is_success() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(201, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(302, "").is_success());
        assert!(!HttpResponse::new(404, "").is_success());
    }

    #[test]
    fn json_decode_error_keeps_body() {
        let err = HttpResponse::new(200, "<html>login</html>")
            .json::<serde_json::Value>()
            .expect_err("must fail");
        assert!(err.to_string().contains("<html>login</html>"));
    }
}
