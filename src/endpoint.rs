use reqwest::Url;

use crate::{Result, SnowError};

/// Formats an instance name into its canonical base URL.
///
/// Example: `"dev12345"` → `"https://dev12345.service-now.com/"`
pub fn instance_to_base_url(instance: &str) -> String {
    let instance = instance.trim();
    if instance.starts_with("http://") || instance.starts_with("https://") {
        if instance.ends_with('/') {
            instance.to_owned()
        } else {
            format!("{instance}/")
        }
    } else {
        format!("https://{instance}.service-now.com/")
    }
}

/// Base URL of an instance and the JSONv2 table URLs derived from it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Endpoint {
    base: Url,
}

impl Endpoint {
    /// Accepts either a bare instance name or a full base URL.
    pub fn for_instance(instance: impl AsRef<str>) -> Result<Self> {
        let instance = instance.as_ref();
        if instance.trim().is_empty() {
            return Err(SnowError::Config("instance name cannot be empty".to_owned()));
        }
        let raw = instance_to_base_url(instance);
        let base = Url::parse(&raw)
            .map_err(|err| SnowError::Config(format!("invalid instance url '{raw}': {err}")))?;
        Ok(Self { base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `{base}{table}.do?JSONv2`
    pub fn table_url(&self, table: &str) -> Result<Url> {
        let table = table.trim();
        if table.is_empty() || table.contains(['/', '?', '#']) {
            return Err(SnowError::Config(format!("invalid table name '{table}'")));
        }
        let mut url = self
            .base
            .join(&format!("{table}.do"))
            .map_err(|err| SnowError::Config(format!("invalid table url for '{table}': {err}")))?;
        url.set_query(Some("JSONv2"));
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::{instance_to_base_url, Endpoint};
    use crate::SnowError;

    #[test]
    fn bare_instance_expands_to_hosted_url() {
        assert_eq!(
            instance_to_base_url(" dev12345 "),
            "https://dev12345.service-now.com/"
        );
    }

    #[test]
    fn full_url_is_kept_with_trailing_slash() {
        assert_eq!(
            instance_to_base_url("http://127.0.0.1:8080/snow"),
            "http://127.0.0.1:8080/snow/"
        );
        assert_eq!(
            instance_to_base_url("https://example.org/"),
            "https://example.org/"
        );
    }

    #[test]
    fn table_url_uses_jsonv2_processor() {
        let endpoint = Endpoint::for_instance("http://127.0.0.1:8080/snow").expect("valid");
        let url = endpoint.table_url("incident").expect("valid table");
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/snow/incident.do?JSONv2");
    }

    #[test]
    fn rejects_empty_instance_and_bad_table() {
        assert!(matches!(
            Endpoint::for_instance("  "),
            Err(SnowError::Config(_))
        ));

        let endpoint = Endpoint::for_instance("dev1").expect("valid");
        assert!(matches!(endpoint.table_url(""), Err(SnowError::Config(_))));
        assert!(matches!(
            endpoint.table_url("../sys_user"),
            Err(SnowError::Config(_))
        ));
    }
}
