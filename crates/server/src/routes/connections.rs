// crates/server/src/routes/connections.rs
//! Upstream connection management.
//!
//! - GET /connections — List configured connections (passwords omitted)
//! - POST /connections — Add or replace a connection by name
//! - PUT /connections/active — Select the active connection

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use houseview_types::ConnectionConfig;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ConnectionListResponse {
    pub connections: Vec<ConnectionConfig>,
    pub active: Option<String>,
}

/// GET /api/connections — the configured connections and which one is active.
async fn list_connections(State(state): State<Arc<AppState>>) -> Json<ConnectionListResponse> {
    Json(ConnectionListResponse {
        connections: state.connections.list(),
        active: state.connections.active_name(),
    })
}

/// POST /api/connections — insert or replace a connection.
async fn upsert_connection(
    State(state): State<Arc<AppState>>,
    Json(config): Json<ConnectionConfig>,
) -> Json<ConnectionListResponse> {
    tracing::info!(name = %config.name, url = %config.url, "Upserting connection");
    state.connections.upsert(config);
    Json(ConnectionListResponse {
        connections: state.connections.list(),
        active: state.connections.active_name(),
    })
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub name: String,
}

/// PUT /api/connections/active — make a named connection active.
async fn select_connection(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SelectRequest>,
) -> ApiResult<Json<ConnectionListResponse>> {
    state.connections.select(&req.name)?;
    tracing::info!(name = %req.name, "Selected active connection");
    Ok(Json(ConnectionListResponse {
        connections: state.connections.list(),
        active: state.connections.active_name(),
    }))
}

/// Build the connections router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/connections", get(list_connections).post(upsert_connection))
        .route("/connections/active", put(select_connection))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::test_support::scripted_state;

    #[tokio::test]
    async fn test_list_includes_active() {
        let state = scripted_state();
        let Json(body) = list_connections(State(state)).await;
        assert_eq!(body.connections.len(), 1);
        assert_eq!(body.active.as_deref(), Some("local"));
    }

    #[tokio::test]
    async fn test_select_unknown_connection_fails() {
        let state = scripted_state();
        let result = select_connection(
            State(state),
            Json(SelectRequest {
                name: "nope".into(),
            }),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_name() {
        let state = scripted_state();
        let Json(body) = upsert_connection(
            State(state.clone()),
            Json(ConnectionConfig::new("local", "http://other:8123")),
        )
        .await;
        assert_eq!(body.connections.len(), 1);
        assert_eq!(body.connections[0].url, "http://other:8123");
    }
}
