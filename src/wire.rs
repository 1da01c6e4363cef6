use serde::Deserialize;

/// JSONv2 response envelope: `{"records": [...]}` or `{"error": ...}`.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub records: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}
