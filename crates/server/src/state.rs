// crates/server/src/state.rs
//! Application state for the Axum server.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use tokio::sync::broadcast;
use uuid::Uuid;

use houseview_core::{ConnectionStore, QueryTransport};

use crate::dashboards::{builtin_dashboards, Dashboard};
use crate::error::ApiError;
use crate::panels::{PanelEvent, PanelHost};

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Named upstream connections, one active. Constructed in `main`, never
    /// a global.
    pub connections: Arc<ConnectionStore>,
    /// Transport every hosted panel fetches through.
    pub transport: Arc<dyn QueryTransport>,
    /// Live panel instances by id.
    pub panels: RwLock<HashMap<Uuid, Arc<PanelHost>>>,
    /// Built-in system-table dashboards.
    pub dashboards: Vec<Dashboard>,
    /// Broadcast sender for panel lifecycle SSE events.
    pub events_tx: broadcast::Sender<PanelEvent>,
    /// IANA timezone used to format time-span boundaries.
    pub timezone: String,
}

impl AppState {
    pub fn new(
        connections: Arc<ConnectionStore>,
        transport: Arc<dyn QueryTransport>,
        timezone: impl Into<String>,
    ) -> Arc<Self> {
        Arc::new(Self {
            start_time: Instant::now(),
            connections,
            transport,
            panels: RwLock::new(HashMap::new()),
            dashboards: builtin_dashboards(),
            events_tx: broadcast::channel(256).0,
            timezone: timezone.into(),
        })
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn panel(&self, id: Uuid) -> Result<Arc<PanelHost>, ApiError> {
        self.panels
            .read()
            .expect("panel map lock")
            .get(&id)
            .cloned()
            .ok_or(ApiError::PanelNotFound(id))
    }

    pub fn insert_panel(&self, host: Arc<PanelHost>) {
        self.panels
            .write()
            .expect("panel map lock")
            .insert(host.id, host);
    }

    /// Remove and return the panel; its in-flight fetch is aborted.
    pub fn remove_panel(&self, id: Uuid) -> Result<Arc<PanelHost>, ApiError> {
        let host = self
            .panels
            .write()
            .expect("panel map lock")
            .remove(&id)
            .ok_or(ApiError::PanelNotFound(id))?;
        host.fetcher.abort();
        Ok(host)
    }

    pub fn panel_count(&self) -> usize {
        self.panels.read().expect("panel map lock").len()
    }

    /// Broadcast a panel event. No subscribers is fine.
    pub fn emit(&self, event: PanelEvent) {
        let _ = self.events_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::test_support::scripted_state;

    #[tokio::test]
    async fn test_app_state_uptime() {
        let state = scripted_state();
        assert!(state.uptime_secs() < 5);
    }

    #[tokio::test]
    async fn test_unknown_panel_is_not_found() {
        let state = scripted_state();
        let id = Uuid::new_v4();
        assert!(matches!(
            state.panel(id),
            Err(ApiError::PanelNotFound(missing)) if missing == id
        ));
    }

    #[tokio::test]
    async fn test_builtin_dashboards_present() {
        let state = scripted_state();
        assert!(!state.dashboards.is_empty());
    }
}
