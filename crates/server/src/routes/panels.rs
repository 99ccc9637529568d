// crates/server/src/routes/panels.rs
//! Live panel instances and their refresh lifecycle.
//!
//! - POST /panels — Instantiate a panel from a descriptor
//! - GET /panels — List live panels
//! - GET /panels/{id} — Panel state plus shaped data
//! - DELETE /panels/{id} — Remove a panel, aborting any in-flight fetch
//! - POST /panels/{id}/refresh — Request a refresh
//! - POST /panels/{id}/page — Fetch the next server-side page
//! - PUT /panels/{id}/sort — Change the sort specification
//! - PUT /panels/{id}/collapsed — Collapse or expand
//! - PUT /panels/{id}/visibility — Report viewport visibility

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use houseview_core::{PanelData, RefreshOutcome, VisibilityProvider};
use houseview_types::{
    PanelDescriptor, PanelVisualState, QuerySettings, RefreshOptions, SortSpec,
};

use crate::error::ApiResult;
use crate::metrics;
use crate::panels::{PanelEvent, PanelHost};
use crate::state::AppState;

fn record_panel_gauge(state: &AppState) {
    metrics::record_panel_count(state.panel_count());
}

fn outcome_label(outcome: RefreshOutcome, visual: &PanelVisualState) -> &'static str {
    match outcome {
        RefreshOutcome::Fetched if visual.error.is_some() => "failed",
        RefreshOutcome::Fetched => "fetched",
        RefreshOutcome::Deduplicated => "deduplicated",
        RefreshOutcome::Deferred => "deferred",
        RefreshOutcome::Idle => "idle",
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelSummary {
    pub id: Uuid,
    pub descriptor: PanelDescriptor,
    pub created_at: String,
}

impl PanelSummary {
    fn from_host(host: &PanelHost) -> Self {
        Self {
            id: host.id,
            descriptor: host.fetcher.descriptor().clone(),
            created_at: host.created_at.to_rfc3339(),
        }
    }
}

/// Full panel state: the visual flags plus kind-shaped data when rows exist.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelStateResponse {
    pub id: Uuid,
    pub descriptor: PanelDescriptor,
    pub visual: PanelVisualState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<PanelData>,
    /// Shaping failures (e.g. a stat query with no rows) land here, separate
    /// from fetch errors in `visual.error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape_error: Option<String>,
    pub sort: Option<SortSpec>,
    pub page: u32,
    pub has_more_pages: bool,
}

impl PanelStateResponse {
    fn from_host(host: &PanelHost) -> Self {
        let (data, shape_error) = match host.fetcher.shaped() {
            Some(Ok(data)) => (Some(data), None),
            Some(Err(err)) => (None, Some(err.to_string())),
            None => (None, None),
        };
        Self {
            id: host.id,
            descriptor: host.fetcher.descriptor().clone(),
            visual: host.fetcher.visual_state(),
            data,
            shape_error,
            sort: host.fetcher.sort(),
            page: host.fetcher.current_page(),
            has_more_pages: host.fetcher.has_more_pages(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub outcome: &'static str,
    pub visual: PanelVisualState,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePanelRequest {
    #[serde(flatten)]
    pub descriptor: PanelDescriptor,
    /// When present, the panel refreshes with these options right after
    /// creation (the mount-with-initial-parameters path). Absent means the
    /// client drives the first refresh itself.
    #[serde(default)]
    pub initial_options: Option<RefreshOptions>,
}

/// POST /api/panels — create a panel instance from a descriptor.
///
/// The query runs over the active connection; its default settings attach to
/// every fetch the panel makes.
async fn create_panel(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePanelRequest>,
) -> ApiResult<Json<PanelSummary>> {
    let settings = state.connections.settings_for(&QuerySettings::new())?;
    let host = PanelHost::new(
        req.descriptor,
        state.transport.clone(),
        settings,
        state.timezone.clone(),
    );
    tracing::info!(panel_id = %host.id, panel = %host.fetcher.descriptor().id, "Created panel");
    let summary = PanelSummary::from_host(&host);
    state.emit(PanelEvent::now(host.id, "created"));
    state.insert_panel(host.clone());
    record_panel_gauge(&state);

    if let Some(options) = req.initial_options {
        let kind = host.fetcher.descriptor().kind;
        let start = Instant::now();
        let outcome = host.fetcher.request_refresh(options).await;
        let visual = host.fetcher.visual_state();
        metrics::record_refresh(kind.as_str(), outcome_label(outcome, &visual), start.elapsed());
        if outcome == RefreshOutcome::Fetched {
            state.emit(PanelEvent::now(host.id, "refreshed"));
        }
    }
    Ok(Json(summary))
}

/// GET /api/panels — all live panels.
async fn list_panels(State(state): State<Arc<AppState>>) -> Json<Vec<PanelSummary>> {
    let mut summaries: Vec<PanelSummary> = state
        .panels
        .read()
        .expect("panel map lock")
        .values()
        .map(|host| PanelSummary::from_host(host))
        .collect();
    summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Json(summaries)
}

/// GET /api/panels/{id} — current state plus shaped data.
async fn get_panel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PanelStateResponse>> {
    let host = state.panel(id)?;
    Ok(Json(PanelStateResponse::from_host(&host)))
}

/// DELETE /api/panels/{id} — drop the panel and abort its in-flight fetch.
async fn delete_panel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    state.remove_panel(id)?;
    tracing::info!(panel_id = %id, "Deleted panel");
    state.emit(PanelEvent::now(id, "deleted"));
    record_panel_gauge(&state);
    Ok(Json(serde_json::json!({ "deleted": id })))
}

/// POST /api/panels/{id}/refresh — ask for a refresh.
///
/// A missing body means default options. Dedup, force bypass, and deferral
/// all happen inside the fetcher; the outcome reports which path was taken.
async fn refresh_panel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    options: Option<Json<RefreshOptions>>,
) -> ApiResult<Json<RefreshResponse>> {
    let host = state.panel(id)?;
    let options = options.map(|Json(o)| o).unwrap_or_default();
    let kind = host.fetcher.descriptor().kind;

    let start = Instant::now();
    let outcome = host.fetcher.request_refresh(options).await;
    let visual = host.fetcher.visual_state();

    let label = outcome_label(outcome, &visual);
    metrics::record_refresh(kind.as_str(), label, start.elapsed());
    if outcome == RefreshOutcome::Fetched {
        state.emit(PanelEvent::now(id, "refreshed"));
    }
    Ok(Json(RefreshResponse {
        outcome: label,
        visual,
    }))
}

/// POST /api/panels/{id}/page — fetch the next server-side page.
async fn next_page(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<RefreshResponse>> {
    let host = state.panel(id)?;
    let kind = host.fetcher.descriptor().kind;

    let start = Instant::now();
    let outcome = host.fetcher.fetch_next_page().await?;
    let visual = host.fetcher.visual_state();

    let label = outcome_label(outcome, &visual);
    metrics::record_refresh(kind.as_str(), label, start.elapsed());
    Ok(Json(RefreshResponse {
        outcome: label,
        visual,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SortRequest {
    pub sort: Option<SortSpec>,
}

/// PUT /api/panels/{id}/sort — change the sort. Server-paginated panels
/// re-run their last query; client panels re-sort in memory.
async fn set_sort(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SortRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let host = state.panel(id)?;
    let outcome = host.fetcher.set_sort(req.sort).await;
    let visual = host.fetcher.visual_state();
    Ok(Json(RefreshResponse {
        outcome: outcome_label(outcome, &visual),
        visual,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CollapsedRequest {
    pub collapsed: bool,
}

/// PUT /api/panels/{id}/collapsed — collapse or expand. Expanding a panel
/// with a parked refresh releases it if the panel is in view.
async fn set_collapsed(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<CollapsedRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let host = state.panel(id)?;
    let outcome = host.fetcher.set_collapsed(req.collapsed).await;
    let visual = host.fetcher.visual_state();
    state.emit(PanelEvent::now(id, "collapsed"));
    Ok(Json(RefreshResponse {
        outcome: outcome_label(outcome, &visual),
        visual,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityRequest {
    pub in_view: bool,
}

/// PUT /api/panels/{id}/visibility — the client's viewport report. Only the
/// rising edge (hidden -> visible) can release a parked refresh.
async fn set_visibility(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<VisibilityRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let host = state.panel(id)?;
    let was_in_view = host.visibility.is_in_view();
    host.visibility.set(req.in_view);

    let outcome = if req.in_view && !was_in_view {
        host.fetcher.notify_in_view().await
    } else {
        RefreshOutcome::Idle
    };
    let visual = host.fetcher.visual_state();
    state.emit(PanelEvent::now(id, "visibility"));
    Ok(Json(RefreshResponse {
        outcome: outcome_label(outcome, &visual),
        visual,
    }))
}

/// Build the panels router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/panels", post(create_panel).get(list_panels))
        .route("/panels/{id}", get(get_panel).delete(delete_panel))
        .route("/panels/{id}/refresh", post(refresh_panel))
        .route("/panels/{id}/page", post(next_page))
        .route("/panels/{id}/sort", put(set_sort))
        .route("/panels/{id}/collapsed", put(set_collapsed))
        .route("/panels/{id}/visibility", put(set_visibility))
}
