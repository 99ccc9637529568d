//! API route handlers for the houseview server.

pub mod connections;
pub mod dashboards;
pub mod events;
pub mod health;
pub mod metrics;
pub mod panels;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined API router with all routes under /api prefix.
///
/// Routes:
/// - GET /api/health - Health check
/// - GET /api/connections - List configured upstream connections
/// - POST /api/connections - Add or replace a connection
/// - PUT /api/connections/active - Select the active connection
/// - GET /api/dashboards - List built-in dashboards
/// - GET /api/dashboards/{id} - One dashboard with its panel descriptors
/// - POST /api/panels - Instantiate a panel from a descriptor
/// - GET /api/panels - List live panels
/// - GET /api/panels/{id} - Panel state plus shaped data
/// - DELETE /api/panels/{id} - Remove a panel, aborting any in-flight fetch
/// - POST /api/panels/{id}/refresh - Request a refresh (dedup/force/deferral)
/// - POST /api/panels/{id}/page - Fetch the next server-side page
/// - PUT /api/panels/{id}/sort - Change the sort specification
/// - PUT /api/panels/{id}/collapsed - Collapse or expand the panel
/// - PUT /api/panels/{id}/visibility - Report viewport visibility
/// - GET /api/events - SSE stream of panel lifecycle events
/// - GET /api/metrics - Prometheus metrics
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", health::router())
        .nest("/api", connections::router())
        .nest("/api", dashboards::router())
        .nest("/api", panels::router())
        .nest("/api", events::router())
        .nest("/api", metrics::router())
        .with_state(state)
}
