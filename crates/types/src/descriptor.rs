// crates/types/src/descriptor.rs
//! Declarative panel configuration.
//!
//! A descriptor binds one SQL template to one visualization kind plus the
//! display/pagination options the panel engine needs. Descriptors are
//! read-only inputs: the engine never mutates them.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Visualization kind for a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "kebab-case")]
pub enum PanelKind {
    Table,
    TransposeTable,
    Timeseries,
    Pie,
    Stat,
}

impl PanelKind {
    /// Stable label for metrics and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::TransposeTable => "transpose-table",
            Self::Timeseries => "timeseries",
            Self::Pie => "pie",
            Self::Stat => "stat",
        }
    }
}

/// Sort direction for server-driven or in-memory sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One sort request: which column, which way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }
}

/// Where pagination happens: in the browser over the full result, or on the
/// server via `LIMIT`/`OFFSET` rewriting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "lowercase")]
pub enum PaginationMode {
    #[default]
    Client,
    Server,
}

/// Optional column hints for response shaping. All fields fall back to
/// meta-driven detection (first time-typed column, numeric columns, etc.).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct FieldHints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_column: Option<String>,
    /// Pivot column for timeseries: one series per distinct value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_column: Option<String>,
    /// Unit suffix for stat panels ("ms", "rows/s", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Pie panels: keep the top N slices and roll the rest into "Other".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_slices: Option<usize>,
}

impl FieldHints {
    pub fn timeseries(time_column: impl Into<String>) -> Self {
        Self {
            time_column: Some(time_column.into()),
            ..Self::default()
        }
    }

    pub fn pie(
        label_column: impl Into<String>,
        value_column: impl Into<String>,
        max_slices: usize,
    ) -> Self {
        Self {
            label_column: Some(label_column.into()),
            value_column: Some(value_column.into()),
            max_slices: Some(max_slices),
            ..Self::default()
        }
    }

    pub fn stat_unit(unit: impl Into<String>) -> Self {
        Self {
            unit: Some(unit.into()),
            ..Self::default()
        }
    }
}

fn default_page_size() -> u32 {
    100
}

/// Declarative configuration for one panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct PanelDescriptor {
    pub id: String,
    pub title: String,
    /// SQL template; `None` means the panel is not queryable ("No query
    /// defined" configuration error at fetch time).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub kind: PanelKind,
    #[serde(default)]
    pub pagination: PaginationMode,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_sort: Option<SortSpec>,
    #[serde(default)]
    pub hints: FieldHints,
}

impl PanelDescriptor {
    pub fn new(id: impl Into<String>, title: impl Into<String>, kind: PanelKind) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            query: None,
            kind,
            pagination: PaginationMode::default(),
            page_size: default_page_size(),
            default_sort: None,
            hints: FieldHints::default(),
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_pagination(mut self, mode: PaginationMode, page_size: u32) -> Self {
        self.pagination = mode;
        self.page_size = page_size;
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.default_sort = Some(sort);
        self
    }

    pub fn with_hints(mut self, hints: FieldHints) -> Self {
        self.hints = hints;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_kind_serde_names() {
        assert_eq!(
            serde_json::to_string(&PanelKind::TransposeTable).unwrap(),
            "\"transpose-table\""
        );
        assert_eq!(serde_json::to_string(&PanelKind::Stat).unwrap(), "\"stat\"");
    }

    #[test]
    fn test_descriptor_defaults_from_minimal_json() {
        let d: PanelDescriptor = serde_json::from_str(
            r#"{"id": "p1", "title": "Queries", "kind": "table"}"#,
        )
        .unwrap();
        assert_eq!(d.pagination, PaginationMode::Client);
        assert_eq!(d.page_size, 100);
        assert!(d.query.is_none());
        assert!(d.default_sort.is_none());
    }

    #[test]
    fn test_sort_direction_sql() {
        assert_eq!(SortDirection::Asc.as_sql(), "ASC");
        assert_eq!(SortDirection::Desc.as_sql(), "DESC");
    }

    #[test]
    fn test_descriptor_roundtrip() {
        let d = PanelDescriptor::new("p1", "Query log", PanelKind::Table)
            .with_query("SELECT * FROM system.query_log")
            .with_pagination(PaginationMode::Server, 50)
            .with_sort(SortSpec::new("event_time", SortDirection::Desc));
        let json = serde_json::to_string(&d).unwrap();
        let back: PanelDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
