//! `snow-http` is an async client for the ServiceNow JSONv2 table API.
//!
//! Two layers:
//! - [`Session`] issues HTTP verbs and retries gateway errors (502, 503,
//!   504), timeouts and connection failures with exponential backoff.
//! - [`RecordTable`] maps record operations onto the session and turns the
//!   `{"records": [...]}` envelope into plain records:
//!   [`RecordTable::get`], [`RecordTable::get_keys`],
//!   [`RecordTable::get_records`], [`RecordTable::insert`],
//!   [`RecordTable::update`], [`RecordTable::delete`].
//!
//! [`RecordClient`] bundles a session with an instance endpoint.

mod client;
mod decode;
mod endpoint;
mod error;
mod options;
mod record;
mod retry_log;
mod session;
mod table;
mod transport;
mod wire;

pub use client::RecordClient;
pub use endpoint::{instance_to_base_url, Endpoint};
pub use error::SnowError;
pub use options::SessionOptions;
pub use record::{field_str, sys_id, Record};
pub use retry_log::{RetryAttempt, RetryLog, TracingRetryLog};
pub use session::{Credentials, RequestOptions, Session};
pub use table::RecordTable;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError, Verb};

pub type Result<T> = std::result::Result<T, SnowError>;
