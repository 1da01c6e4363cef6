use serde_json::Value;

use crate::{
    decode::decode_envelope,
    session::{required_env, RequestOptions},
    transport::{ReqwestTransport, Transport, Verb},
    Credentials, Endpoint, RecordTable, Result, Session, SessionOptions, SnowError,
};

/// Client bound to one instance: a [`Session`] plus the instance [`Endpoint`].
#[derive(Clone, Debug)]
pub struct RecordClient<T = ReqwestTransport> {
    session: Session<T>,
    endpoint: Endpoint,
}

impl RecordClient<ReqwestTransport> {
    /// Creates a client for an instance name (`"dev12345"`) or base URL.
    pub fn new(instance: impl AsRef<str>, credentials: Credentials) -> Result<Self> {
        Ok(Self::with_session(
            Session::new(credentials)?,
            Endpoint::for_instance(instance)?,
        ))
    }

    /// Creates a client from environment variables.
    ///
    /// Reads:
    /// - `SNOW_INSTANCE` — instance name or base URL
    /// - `SNOW_USER`, `SNOW_PASSWORD` — basic-auth credentials
    /// - optional retry variables, see [`SessionOptions::from_env`]
    pub fn from_env() -> Result<Self> {
        let endpoint = Endpoint::for_instance(required_env("SNOW_INSTANCE")?)?;
        let session = Session::new(Credentials::from_env()?)?.with_options(SessionOptions::from_env()?);
        Ok(Self::with_session(session, endpoint))
    }
}

impl<T: Transport> RecordClient<T> {
    pub fn with_session(session: Session<T>, endpoint: Endpoint) -> Self {
        Self { session, endpoint }
    }

    pub fn session(&self) -> &Session<T> {
        &self.session
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Returns a table view borrowing this client's session.
    pub fn table(&self, name: impl Into<String>) -> RecordTable<'_, T> {
        RecordTable::new(&self.session, &self.endpoint, name)
    }

    /// Issues a GET against `table` with `sysparm_*` query pairs.
    ///
    /// Returns the `records` array, or `None` when nothing was found.
    pub async fn get(&self, table: &str, params: &[(&str, &str)]) -> Result<Option<Vec<Value>>> {
        fetch_records(&self.session, &self.endpoint, Verb::Get, table, params, None).await
    }

    /// Issues a POST against `table`.
    ///
    /// A missing or empty-object payload returns `None` without a request.
    pub async fn post(
        &self,
        table: &str,
        params: &[(&str, &str)],
        payload: Option<Value>,
    ) -> Result<Option<Vec<Value>>> {
        let Some(payload) = payload.filter(|payload| !is_empty_payload(payload)) else {
            tracing::debug!(table, "post skipped: empty payload");
            return Ok(None);
        };
        fetch_records(&self.session, &self.endpoint, Verb::Post, table, params, Some(payload))
            .await
    }
}

/// Sends one table request and interprets the record envelope.
///
/// A 3xx status is what the platform answers for unknown processors and
/// login redirects; it is reported as `None`. Other HTTP and transport
/// errors propagate.
pub(crate) async fn fetch_records<T: Transport>(
    session: &Session<T>,
    endpoint: &Endpoint,
    verb: Verb,
    table: &str,
    params: &[(&str, &str)],
    body: Option<Value>,
) -> Result<Option<Vec<Value>>> {
    let url = endpoint.table_url(table)?;
    let mut options = params
        .iter()
        .fold(RequestOptions::new(), |options, (key, value)| {
            options.query(*key, *value)
        });
    options.body = body;

    match session.send(verb, url.as_str(), options).await {
        Ok(response) => decode_envelope(&response),
        Err(SnowError::Http { status, .. }) if (300..400).contains(&status) => {
            tracing::debug!(verb = %verb, table, status, "redirected, treating as no records");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

pub(crate) fn is_empty_payload(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
