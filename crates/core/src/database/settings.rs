//! Session-level settings applied when a connection is opened

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Static session settings for the analytical store
///
/// Nothing is set unless configured. Credentials are meant to be filled in
/// from an external config file rather than compiled in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Object-store access key id
    pub s3_access_key_id: Option<String>,
    /// Object-store secret access key
    pub s3_secret_access_key: Option<String>,
    /// Object-store region
    pub s3_region: Option<String>,
    /// Custom object-store endpoint (for S3-compatible services)
    pub s3_endpoint: Option<String>,
    /// Any further `SET` options, applied in name order
    pub extra: BTreeMap<String, String>,
}

impl ConnectionSettings {
    /// Create empty settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set object-store credentials
    pub fn with_s3_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.s3_access_key_id = Some(access_key_id.into());
        self.s3_secret_access_key = Some(secret_access_key.into());
        self
    }

    /// Set the object-store region
    pub fn with_s3_region(mut self, region: impl Into<String>) -> Self {
        self.s3_region = Some(region.into());
        self
    }

    /// Set an arbitrary session option
    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    /// Render the `SET` statements for every configured value
    pub fn statements(&self) -> Vec<String> {
        let named = [
            ("s3_access_key_id", &self.s3_access_key_id),
            ("s3_secret_access_key", &self.s3_secret_access_key),
            ("s3_region", &self.s3_region),
            ("s3_endpoint", &self.s3_endpoint),
        ];

        named
            .into_iter()
            .filter_map(|(name, value)| value.as_deref().map(|v| set_statement(name, v)))
            .chain(
                self.extra
                    .iter()
                    .map(|(name, value)| set_statement(name, value)),
            )
            .collect()
    }
}

fn set_statement(name: &str, value: &str) -> String {
    format!("SET {}='{}';", name, value.replace('\'', "''"))
}
