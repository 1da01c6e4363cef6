/// A single table row as returned by the platform: field name → value.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Returns a string field of a record, e.g. `sys_id`.
pub fn field_str<'a>(record: &'a Record, name: &str) -> Option<&'a str> {
    record.get(name).and_then(serde_json::Value::as_str)
}

/// Returns the record's `sys_id`.
pub fn sys_id(record: &Record) -> Option<&str> {
    field_str(record, "sys_id")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{field_str, sys_id, Record};

    #[test]
    fn reads_string_fields_only() {
        let record: Record = serde_json::from_value(json!({
            "sys_id": "abc",
            "priority": 3
        }))
        .expect("object");

        assert_eq!(sys_id(&record), Some("abc"));
        assert_eq!(field_str(&record, "priority"), None);
        assert_eq!(field_str(&record, "missing"), None);
    }
}
