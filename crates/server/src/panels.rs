// crates/server/src/panels.rs
//! One hosted panel instance: the core fetcher plus the server-side
//! visibility flag the client keeps updated.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use houseview_core::{PanelFetcher, QueryTransport, SharedVisibility};
use houseview_types::{PanelDescriptor, QuerySettings};

/// Lifecycle event broadcast over the SSE stream.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelEvent {
    pub panel_id: Uuid,
    pub event: &'static str,
    pub timestamp: String,
}

impl PanelEvent {
    pub fn now(panel_id: Uuid, event: &'static str) -> Self {
        Self {
            panel_id,
            event,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

pub struct PanelHost {
    pub id: Uuid,
    pub fetcher: PanelFetcher,
    /// Flipped by the client's viewport reports. Panels start visible so a
    /// headless client that never reports still gets data.
    pub visibility: SharedVisibility,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl PanelHost {
    pub fn new(
        descriptor: PanelDescriptor,
        transport: Arc<dyn QueryTransport>,
        settings: QuerySettings,
        timezone: impl Into<String>,
    ) -> Arc<Self> {
        let visibility = SharedVisibility::visible();
        let fetcher = PanelFetcher::new(
            descriptor,
            transport,
            settings,
            timezone,
            Arc::new(visibility.clone()),
        );
        Arc::new(Self {
            id: Uuid::new_v4(),
            fetcher,
            visibility,
            created_at: chrono::Utc::now(),
        })
    }
}
