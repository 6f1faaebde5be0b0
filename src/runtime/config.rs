//! Session configuration.

use crate::entity::AutoFetch;
use crate::error::{Result, SirenError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Settings for a [`SirenClient`](crate::clients::SirenClient) session.
///
/// ```ignore
/// let config = ClientConfig::new("http://api.x.io")
///     .with_auto_fetch(AutoFetch::Linked)
///     .with_header("Accept", "application/vnd.siren+json");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL that entity names are resolved against.
    pub api_root: String,
    pub auto_fetch: AutoFetch,
    /// Headers sent with every fetch of the session.
    pub default_headers: BTreeMap<String, String>,
}

impl ClientConfig {
    pub fn new(api_root: impl Into<String>) -> Self {
        Self {
            api_root: api_root.into(),
            ..Self::default()
        }
    }

    pub fn with_auto_fetch(mut self, auto_fetch: AutoFetch) -> Self {
        self.auto_fetch = auto_fetch;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    /// Reads a config from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SirenError::Payload(e.to_string()))
    }

    /// `api_root` joined with `name` by exactly one slash.
    pub fn entity_url(&self, name: &str) -> String {
        format!(
            "{}/{}",
            self.api_root.trim_end_matches('/'),
            name.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_with_defaults() {
        let config = ClientConfig::from_json(r#"{ "api_root": "http://api.x.io", "auto_fetch": "linked" }"#)
            .unwrap();
        assert_eq!(config.api_root, "http://api.x.io");
        assert_eq!(config.auto_fetch, AutoFetch::Linked);
        assert!(config.default_headers.is_empty());
    }

    #[test]
    fn test_from_json_rejects_bad_policy() {
        assert!(ClientConfig::from_json(r#"{ "auto_fetch": "sometimes" }"#).is_err());
    }

    #[test]
    fn test_entity_url() {
        assert_eq!(
            ClientConfig::new("http://api.x.io/").entity_url("/orders"),
            "http://api.x.io/orders"
        );
        assert_eq!(
            ClientConfig::new("http://api.x.io").entity_url("orders"),
            "http://api.x.io/orders"
        );
    }
}
