// crates/server/src/lib.rs
//! Houseview server library.
//!
//! This crate provides the Axum-based HTTP server for the houseview admin
//! console. It hosts panel instances over an upstream ClickHouse-compatible
//! connection and serves a REST API for their refresh lifecycle.

pub mod dashboards;
pub mod error;
pub mod metrics;
pub mod panels;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use routes::api_routes;
pub use state::AppState;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Create the Axum application with all routes and middleware.
///
/// This sets up:
/// - API routes (health, connections, dashboards, panels, events, metrics)
/// - optional static file serving for the frontend bundle
/// - CORS for development (allows any origin)
/// - Request tracing
pub fn create_app(state: Arc<AppState>, static_dir: Option<PathBuf>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new().merge(api_routes(state));

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(cors).layer(TraceLayer::new_for_http())
}
