use serde_json::Value;

use crate::{
    client::fetch_records,
    decode::{into_keys, into_records},
    transport::{ReqwestTransport, Transport, Verb},
    Endpoint, Record, Result, Session,
};

/// CRUD view over one table, e.g. `incident`.
///
/// Borrows the session it sends through. "Nothing found" is `None` or an
/// empty `Vec`; only transport and HTTP failures are errors.
#[derive(Debug)]
pub struct RecordTable<'a, T = ReqwestTransport> {
    session: &'a Session<T>,
    endpoint: &'a Endpoint,
    name: String,
}

impl<'a, T: Transport> RecordTable<'a, T> {
    pub fn new(session: &'a Session<T>, endpoint: &'a Endpoint, name: impl Into<String>) -> Self {
        Self {
            session,
            endpoint,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fetches a record by `sys_id`.
    pub async fn get(&self, sys_id: &str) -> Result<Option<Record>> {
        if sys_id.trim().is_empty() {
            return Ok(None);
        }
        let records = self
            .records(
                Verb::Get,
                &[("sysparm_action", "get"), ("sysparm_sys_id", sys_id)],
                None,
            )
            .await?;
        Ok(records.and_then(|records| records.into_iter().next()))
    }

    /// Returns the `sys_id`s matching an encoded query such as
    /// `"name=Arista Networks"`.
    pub async fn get_keys(&self, filter: &str) -> Result<Vec<String>> {
        let keys = self
            .raw(
                Verb::Get,
                &[("sysparm_action", "getKeys"), ("sysparm_query", filter)],
                None,
            )
            .await?;
        keys.map(into_keys).transpose().map(Option::unwrap_or_default)
    }

    /// Returns the full records matching an encoded query.
    pub async fn get_records(&self, filter: &str) -> Result<Vec<Record>> {
        let records = self
            .records(
                Verb::Get,
                &[("sysparm_action", "getRecords"), ("sysparm_query", filter)],
                None,
            )
            .await?;
        Ok(records.unwrap_or_default())
    }

    /// Creates a record and returns what the service stored.
    ///
    /// An empty `data` map returns `None` without a request.
    pub async fn insert(&self, data: &Record) -> Result<Option<Vec<Record>>> {
        if data.is_empty() {
            return Ok(None);
        }
        self.records(
            Verb::Post,
            &[("sysparm_action", "insert")],
            Some(Value::Object(data.clone())),
        )
        .await
    }

    /// Creates several records in one request.
    pub async fn insert_multiple(&self, records: &[Record]) -> Result<Option<Vec<Record>>> {
        let records: Vec<Value> = records
            .iter()
            .filter(|record| !record.is_empty())
            .cloned()
            .map(Value::Object)
            .collect();
        if records.is_empty() {
            return Ok(None);
        }
        self.records(
            Verb::Post,
            &[("sysparm_action", "insertMultiple")],
            Some(serde_json::json!({ "records": records })),
        )
        .await
    }

    /// Applies partial `data` to every record matching `query`.
    ///
    /// An empty `data` map returns `None` without a request.
    pub async fn update(&self, data: &Record, query: &str) -> Result<Option<Vec<Record>>> {
        if data.is_empty() {
            return Ok(None);
        }
        self.records(
            Verb::Put,
            &[("sysparm_action", "update"), ("sysparm_query", query)],
            Some(Value::Object(data.clone())),
        )
        .await
    }

    /// Deletes a record by `sys_id` and returns it, or `None` if it did not
    /// exist.
    pub async fn delete(&self, sys_id: &str) -> Result<Option<Record>> {
        if sys_id.trim().is_empty() {
            return Ok(None);
        }
        let records = self
            .records(
                Verb::Delete,
                &[("sysparm_action", "deleteRecord"), ("sysparm_sys_id", sys_id)],
                None,
            )
            .await?;
        Ok(records.and_then(|records| records.into_iter().next()))
    }

    /// Deletes every record matching an encoded query.
    pub async fn delete_multiple(&self, filter: &str) -> Result<Vec<Record>> {
        let records = self
            .records(
                Verb::Delete,
                &[("sysparm_action", "deleteMultiple"), ("sysparm_query", filter)],
                None,
            )
            .await?;
        Ok(records.unwrap_or_default())
    }

    async fn records(
        &self,
        verb: Verb,
        params: &[(&str, &str)],
        body: Option<Value>,
    ) -> Result<Option<Vec<Record>>> {
        self.raw(verb, params, body)
            .await?
            .map(into_records)
            .transpose()
    }

    async fn raw(
        &self,
        verb: Verb,
        params: &[(&str, &str)],
        body: Option<Value>,
    ) -> Result<Option<Vec<Value>>> {
        fetch_records(self.session, self.endpoint, verb, &self.name, params, body).await
    }
}
