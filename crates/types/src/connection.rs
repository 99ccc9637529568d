// crates/types/src/connection.rs
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::settings::QuerySettings;

/// One named upstream connection. The password never serializes back out to
/// the frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    pub name: String,
    pub url: String,
    pub username: String,
    #[serde(default, skip_serializing)]
    #[ts(skip)]
    pub password: Option<String>,
    /// Settings attached to every query issued over this connection.
    #[serde(default)]
    pub default_settings: QuerySettings,
}

impl ConnectionConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            username: "default".to_string(),
            password: None,
            default_settings: QuerySettings::new(),
        }
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: Option<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password;
        self
    }

    pub fn with_default_settings(mut self, settings: QuerySettings) -> Self {
        self.default_settings = settings;
        self
    }
}
