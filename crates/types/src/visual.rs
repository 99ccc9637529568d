// crates/types/src/visual.rs
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::result_set::Row;

/// Display state owned by exactly one panel fetcher instance.
///
/// Only that instance's fetch completion/failure handlers and explicit
/// collapse/expand actions mutate it. `error: None` means no error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct PanelVisualState {
    pub is_collapsed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "Array<Record<string, unknown>> | null")]
    pub data: Option<Vec<Row>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub is_loading: bool,
}
