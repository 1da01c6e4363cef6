use serde_json::Value;

use crate::{transport::HttpResponse, wire::Envelope, Record, Result, SnowError};

/// Interprets a successful response body.
///
/// Returns `None` when the body is empty, when the envelope carries an
/// `error` field, or when `records` is missing or empty. A body that is not
/// a JSON object is a [`SnowError::Decode`].
pub(crate) fn decode_envelope(response: &HttpResponse) -> Result<Option<Vec<Value>>> {
    if response.body.trim().is_empty() {
        return Ok(None);
    }

    let envelope: Envelope = response.json()?;
    if let Some(error) = envelope.error.filter(|error| !error.is_null()) {
        tracing::debug!(%error, "service reported an error in a success response");
        return Ok(None);
    }

    Ok(envelope.records.filter(|records| !records.is_empty()))
}

pub(crate) fn into_records(values: Vec<Value>) -> Result<Vec<Record>> {
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| match value {
            Value::Object(record) => Ok(record),
            other => Err(SnowError::Decode(format!(
                "expected record object at index {index}, got {other}"
            ))),
        })
        .collect()
}

pub(crate) fn into_keys(values: Vec<Value>) -> Result<Vec<String>> {
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| match value {
            Value::String(key) => Ok(key),
            other => Err(SnowError::Decode(format!(
                "expected record key at index {index}, got {other}"
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{decode, transport::HttpResponse, SnowError};

    fn ok(body: serde_json::Value) -> HttpResponse {
        HttpResponse::new(200, body.to_string())
    }

    #[test]
    fn returns_records_verbatim() {
        let records = decode::decode_envelope(&ok(json!({
            "records": [{"sys_id": "a"}, {"sys_id": "b"}]
        })))
        .expect("must decode")
        .expect("must contain records");

        assert_eq!(records, vec![json!({"sys_id": "a"}), json!({"sys_id": "b"})]);
    }

    #[test]
    fn empty_missing_or_error_is_none() {
        for body in [
            json!({"records": []}),
            json!({}),
            json!({"error": "Invalid action: dummy"}),
            json!({"error": {"message": "no"}, "records": [{"sys_id": "a"}]}),
        ] {
            let decoded = decode::decode_envelope(&ok(body.clone())).expect("must decode");
            assert!(decoded.is_none(), "{body} must collapse to None");
        }
        assert!(decode::decode_envelope(&HttpResponse::new(204, ""))
            .expect("must decode")
            .is_none());
    }

    #[test]
    fn null_error_field_is_ignored() {
        let decoded = decode::decode_envelope(&ok(json!({
            "error": null,
            "records": [{"sys_id": "a"}]
        })))
        .expect("must decode");
        assert_eq!(decoded.map(|r| r.len()), Some(1));
    }

    #[test]
    fn non_json_body_is_decode_error() {
        let err = decode::decode_envelope(&HttpResponse::new(200, "<html></html>"))
            .expect_err("must fail");
        assert!(matches!(err, SnowError::Decode(_)));
    }

    #[test]
    fn record_and_key_shapes_are_checked() {
        assert!(matches!(
            decode::into_records(vec![json!({"a": 1}), json!("b")]),
            Err(SnowError::Decode(msg)) if msg.contains("index 1")
        ));
        assert!(matches!(
            decode::into_keys(vec![json!({"a": 1})]),
            Err(SnowError::Decode(_))
        ));
        assert_eq!(
            decode::into_keys(vec![json!("k1"), json!("k2")]).expect("keys"),
            vec!["k1".to_owned(), "k2".to_owned()]
        );
    }
}
