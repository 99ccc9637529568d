// crates/core/src/shape.rs
//! Per-visualization response shaping: pure functions from a result set to
//! the structure each panel kind renders.
//!
//! ClickHouse's `FORMAT JSON` serializes 64-bit integers as strings, so all
//! numeric handling goes through [`numeric_value`] which accepts both
//! spellings.

use serde::Serialize;
use serde_json::Value;

use houseview_types::{ColumnMeta, FieldHints, PanelKind, ResultSet, Row, SortSpec};

use crate::error::PanelError;

/// One timeseries line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub name: String,
    /// One entry per time point; `None` where the series has no sample.
    pub values: Vec<Option<f64>>,
}

/// One pie slice.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
}

/// Shaped panel data, ready for the frontend renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum PanelData {
    Table {
        columns: Vec<ColumnMeta>,
        rows: Vec<Row>,
    },
    TransposeTable {
        rows: Vec<Row>,
    },
    Timeseries {
        time_column: String,
        times: Vec<Value>,
        series: Vec<Series>,
    },
    Pie {
        slices: Vec<PieSlice>,
    },
    Stat {
        value: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
    },
}

/// Shape `rs` for the given panel kind. `sort` applies in-memory ordering
/// for client-paginated tables (server mode sorts in SQL instead).
pub fn shape(
    kind: PanelKind,
    rs: &ResultSet,
    hints: &FieldHints,
    sort: Option<&SortSpec>,
) -> Result<PanelData, PanelError> {
    match kind {
        PanelKind::Table => Ok(shape_table(rs, sort)),
        PanelKind::TransposeTable => Ok(shape_transpose(rs)),
        PanelKind::Timeseries => shape_timeseries(rs, hints),
        PanelKind::Pie => shape_pie(rs, hints),
        PanelKind::Stat => shape_stat(rs, hints),
    }
}

/// A numeric cell: a JSON number, or a numeric string.
fn numeric_value(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn shape_table(rs: &ResultSet, sort: Option<&SortSpec>) -> PanelData {
    let mut rows = rs.data.clone();
    if let Some(sort) = sort {
        sort_rows(&mut rows, sort);
    }
    PanelData::Table {
        columns: rs.meta.clone(),
        rows,
    }
}

/// Numeric-aware in-memory sort for client-mode tables.
pub fn sort_rows(rows: &mut [Row], sort: &SortSpec) {
    rows.sort_by(|a, b| {
        let av = a.get(&sort.column);
        let bv = b.get(&sort.column);
        let ord = match (av.and_then(numeric_value), bv.and_then(numeric_value)) {
            (Some(an), Some(bn)) => an.partial_cmp(&bn).unwrap_or(std::cmp::Ordering::Equal),
            _ => {
                let astr = av.map(cell_text).unwrap_or_default();
                let bstr = bv.map(cell_text).unwrap_or_default();
                astr.cmp(&bstr)
            }
        };
        match sort.direction {
            houseview_types::SortDirection::Asc => ord,
            houseview_types::SortDirection::Desc => ord.reverse(),
        }
    });
}

fn cell_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One output row per *column*: a `field` cell plus one cell per source
/// row. The single-row case degenerates to field/value pairs.
fn shape_transpose(rs: &ResultSet) -> PanelData {
    let rows = rs
        .meta
        .iter()
        .map(|col| {
            let mut out = Row::new();
            out.insert("field".to_string(), Value::String(col.name.clone()));
            if rs.data.len() == 1 {
                let cell = rs.data[0].get(&col.name).cloned().unwrap_or(Value::Null);
                out.insert("value".to_string(), cell);
            } else {
                for (i, source) in rs.data.iter().enumerate() {
                    let cell = source.get(&col.name).cloned().unwrap_or(Value::Null);
                    out.insert(format!("row_{}", i + 1), cell);
                }
            }
            out
        })
        .collect();
    PanelData::TransposeTable { rows }
}

fn time_column<'a>(rs: &'a ResultSet, hints: &FieldHints) -> Result<&'a ColumnMeta, PanelError> {
    if let Some(name) = &hints.time_column {
        return rs
            .column(name)
            .ok_or_else(|| PanelError::Query(format!("Time column {name:?} not in result")));
    }
    rs.find_column(ColumnMeta::is_time)
        .ok_or_else(|| PanelError::Query("Result has no time column".to_string()))
}

fn shape_timeseries(rs: &ResultSet, hints: &FieldHints) -> Result<PanelData, PanelError> {
    let time = time_column(rs, hints)?.name.clone();

    if let Some(pivot) = &hints.series_column {
        return shape_timeseries_pivoted(rs, &time, pivot, hints);
    }

    let times: Vec<Value> = rs
        .data
        .iter()
        .map(|row| row.get(&time).cloned().unwrap_or(Value::Null))
        .collect();
    let series = rs
        .meta
        .iter()
        .filter(|m| m.name != time && m.is_numeric())
        .map(|m| Series {
            name: m.name.clone(),
            values: rs
                .data
                .iter()
                .map(|row| row.get(&m.name).and_then(numeric_value))
                .collect(),
        })
        .collect();
    Ok(PanelData::Timeseries {
        time_column: time,
        times,
        series,
    })
}

/// Pivot long-format rows (time, series, value) into one series per
/// distinct value of the pivot column, aligned on first-seen time order.
fn shape_timeseries_pivoted(
    rs: &ResultSet,
    time: &str,
    pivot: &str,
    hints: &FieldHints,
) -> Result<PanelData, PanelError> {
    if rs.column(pivot).is_none() {
        return Err(PanelError::Query(format!(
            "Series column {pivot:?} not in result"
        )));
    }
    let value_column = match &hints.value_column {
        Some(name) => name.clone(),
        None => rs
            .find_column(ColumnMeta::is_numeric)
            .ok_or_else(|| PanelError::Query("Result has no numeric column".to_string()))?
            .name
            .clone(),
    };

    let mut times: Vec<Value> = Vec::new();
    let mut names: Vec<String> = Vec::new();
    for row in &rs.data {
        let t = row.get(time).cloned().unwrap_or(Value::Null);
        if !times.contains(&t) {
            times.push(t);
        }
        let name = row.get(pivot).map(cell_text).unwrap_or_default();
        if !names.contains(&name) {
            names.push(name);
        }
    }

    let series = names
        .into_iter()
        .map(|name| {
            let values = times
                .iter()
                .map(|t| {
                    rs.data
                        .iter()
                        .find(|row| {
                            row.get(time) == Some(t)
                                && row.get(pivot).map(cell_text).as_deref() == Some(&name)
                        })
                        .and_then(|row| row.get(&value_column))
                        .and_then(numeric_value)
                })
                .collect();
            Series { name, values }
        })
        .collect();

    Ok(PanelData::Timeseries {
        time_column: time.to_string(),
        times,
        series,
    })
}

fn shape_pie(rs: &ResultSet, hints: &FieldHints) -> Result<PanelData, PanelError> {
    let label = match &hints.label_column {
        Some(name) => name.clone(),
        None => rs
            .find_column(ColumnMeta::is_string)
            .or_else(|| rs.meta.first())
            .ok_or_else(|| PanelError::Query("Result has no columns".to_string()))?
            .name
            .clone(),
    };
    let value = match &hints.value_column {
        Some(name) => name.clone(),
        None => rs
            .find_column(|m| m.is_numeric() && m.name != label)
            .ok_or_else(|| PanelError::Query("Result has no numeric column".to_string()))?
            .name
            .clone(),
    };

    let mut slices: Vec<PieSlice> = rs
        .data
        .iter()
        .map(|row| PieSlice {
            label: row.get(&label).map(cell_text).unwrap_or_default(),
            value: row.get(&value).and_then(numeric_value).unwrap_or(0.0),
        })
        .collect();

    if let Some(max) = hints.max_slices {
        if max > 0 && slices.len() > max {
            slices.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(std::cmp::Ordering::Equal));
            let rest: f64 = slices.split_off(max).iter().map(|s| s.value).sum();
            slices.push(PieSlice {
                label: "Other".to_string(),
                value: rest,
            });
        }
    }

    Ok(PanelData::Pie { slices })
}

fn shape_stat(rs: &ResultSet, hints: &FieldHints) -> Result<PanelData, PanelError> {
    let row = rs
        .data
        .first()
        .ok_or_else(|| PanelError::Query("Query returned no rows".to_string()))?;
    let column = match &hints.value_column {
        Some(name) => name.clone(),
        None => rs
            .find_column(ColumnMeta::is_numeric)
            .or_else(|| rs.meta.first())
            .ok_or_else(|| PanelError::Query("Result has no columns".to_string()))?
            .name
            .clone(),
    };
    let raw = row.get(&column).cloned().unwrap_or(Value::Null);
    // Numeric columns come back as strings for 64-bit types; normalize them
    // so the frontend always sees a JSON number.
    let numeric_column = rs
        .meta
        .iter()
        .find(|m| m.name == column)
        .is_some_and(|m| m.is_numeric());
    let value = if numeric_column {
        numeric_value(&raw).map(Value::from).unwrap_or(raw)
    } else {
        raw
    };
    Ok(PanelData::Stat {
        value,
        unit: hints.unit.clone(),
    })
}
