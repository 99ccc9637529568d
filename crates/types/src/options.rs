// crates/types/src/options.rs
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::time_span::TimeSpan;

/// Parameters for one refresh of a panel.
///
/// The serialized form (minus `force_refresh`) is the panel's dedup cache
/// key: a refresh whose key is byte-identical to the last executed one is
/// skipped unless `force_refresh` is set, which bypasses the comparison
/// entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct RefreshOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_time_span: Option<TimeSpan>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_filter: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub force_refresh: bool,

    /// Fetcher-specific extension fields, carried verbatim. Keys serialize
    /// sorted, so insertion order cannot perturb the cache key.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    #[ts(type = "Record<string, unknown>")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RefreshOptions {
    pub fn with_time_span(span: TimeSpan) -> Self {
        Self {
            selected_time_span: Some(span),
            ..Self::default()
        }
    }

    pub fn forced(mut self) -> Self {
        self.force_refresh = true;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.input_filter = Some(filter.into());
        self
    }

    /// The dedup key: canonical JSON of everything except `force_refresh`.
    pub fn cache_key(&self) -> String {
        let mut key = self.clone();
        key.force_refresh = false;
        serde_json::to_string(&key).expect("refresh options serialize to JSON")
    }
}
