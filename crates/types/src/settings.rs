// crates/types/src/settings.rs
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Server settings sent with every query (`max_execution_time`, etc.).
///
/// Backed by a sorted map so the serialized form — and therefore any cache
/// key derived from it — is stable regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
pub struct QuerySettings(#[ts(type = "Record<string, string>")] BTreeMap<String, String>);

impl QuerySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Overlay `other` on top of these settings; `other` wins on conflicts.
    pub fn merged_with(&self, other: &QuerySettings) -> QuerySettings {
        let mut merged = self.0.clone();
        for (k, v) in &other.0 {
            merged.insert(k.clone(), v.clone());
        }
        QuerySettings(merged)
    }
}

impl FromIterator<(String, String)> for QuerySettings {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_is_order_independent() {
        let mut a = QuerySettings::new();
        a.set("max_execution_time", "30").set("readonly", "1");
        let mut b = QuerySettings::new();
        b.set("readonly", "1").set("max_execution_time", "30");
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_merge_prefers_overlay() {
        let mut base = QuerySettings::new();
        base.set("max_execution_time", "30").set("readonly", "1");
        let mut overlay = QuerySettings::new();
        overlay.set("max_execution_time", "5");

        let merged = base.merged_with(&overlay);
        assert_eq!(merged.get("max_execution_time"), Some("5"));
        assert_eq!(merged.get("readonly"), Some("1"));
    }

    #[test]
    fn test_roundtrip() {
        let mut s = QuerySettings::new();
        s.set("readonly", "1");
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#"{"readonly":"1"}"#);
        let back: QuerySettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
