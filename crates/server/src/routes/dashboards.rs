// crates/server/src/routes/dashboards.rs
//! Built-in dashboard catalog.
//!
//! - GET /dashboards — List dashboards (id + title only)
//! - GET /dashboards/{id} — One dashboard with its panel descriptors

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::dashboards::Dashboard;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub id: String,
    pub title: String,
    pub panel_count: usize,
}

/// GET /api/dashboards — dashboard summaries.
async fn list_dashboards(State(state): State<Arc<AppState>>) -> Json<Vec<DashboardSummary>> {
    let summaries = state
        .dashboards
        .iter()
        .map(|d| DashboardSummary {
            id: d.id.clone(),
            title: d.title.clone(),
            panel_count: d.panels.len(),
        })
        .collect();
    Json(summaries)
}

/// GET /api/dashboards/{id} — one dashboard with full panel descriptors.
async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Dashboard>> {
    state
        .dashboards
        .iter()
        .find(|d| d.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown dashboard {id:?}")))
}

/// Build the dashboards router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/dashboards", get(list_dashboards))
        .route("/dashboards/{id}", get(get_dashboard))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::test_support::scripted_state;

    #[tokio::test]
    async fn test_list_matches_builtins() {
        let state = scripted_state();
        let expected = state.dashboards.len();
        let Json(body) = list_dashboards(State(state)).await;
        assert_eq!(body.len(), expected);
    }

    #[tokio::test]
    async fn test_get_unknown_dashboard_fails() {
        let state = scripted_state();
        let result = get_dashboard(State(state), Path("missing".into())).await;
        assert!(result.is_err());
    }
}
