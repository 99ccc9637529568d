// crates/types/src/result_set.rs
//! The `FORMAT JSON` result envelope returned by ClickHouse-compatible
//! servers: column metadata plus rows keyed by column name.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One result row, keyed by column name. Column order lives in `meta`.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Column name and server-side type, as reported in the envelope's `meta`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
pub struct ColumnMeta {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
}

impl ColumnMeta {
    /// The type with `Nullable(...)` / `LowCardinality(...)` wrappers peeled.
    pub fn base_type(&self) -> &str {
        let mut t = self.column_type.as_str();
        loop {
            let peeled = t
                .strip_prefix("Nullable(")
                .or_else(|| t.strip_prefix("LowCardinality("))
                .and_then(|rest| rest.strip_suffix(')'));
            match peeled {
                Some(inner) => t = inner,
                None => return t,
            }
        }
    }

    pub fn is_numeric(&self) -> bool {
        let t = self.base_type();
        t.starts_with("UInt")
            || t.starts_with("Int")
            || t.starts_with("Float")
            || t.starts_with("Decimal")
    }

    pub fn is_time(&self) -> bool {
        let t = self.base_type();
        t.starts_with("DateTime") || t == "Date" || t == "Date32"
    }

    pub fn is_string(&self) -> bool {
        let t = self.base_type();
        t == "String" || t.starts_with("FixedString") || t.starts_with("Enum")
    }
}

/// Query execution statistics reported alongside the data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
pub struct QueryStatistics {
    #[serde(default)]
    pub elapsed: f64,
    #[serde(default)]
    pub rows_read: u64,
    #[serde(default)]
    pub bytes_read: u64,
}

/// A parsed query result: `{ meta, data, rows, statistics }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
pub struct ResultSet {
    #[serde(default)]
    pub meta: Vec<ColumnMeta>,
    #[serde(default)]
    #[ts(type = "Array<Record<string, unknown>>")]
    pub data: Vec<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<QueryStatistics>,
}

impl ResultSet {
    /// First column satisfying `pred`, by meta order.
    pub fn find_column(&self, pred: impl Fn(&ColumnMeta) -> bool) -> Option<&ColumnMeta> {
        self.meta.iter().find(|m| pred(m))
    }

    pub fn column(&self, name: &str) -> Option<&ColumnMeta> {
        self.meta.iter().find(|m| m.name == name)
    }
}
