// crates/server/src/routes/events.rs
//! API routes for panel lifecycle events.
//!
//! - GET /events — SSE stream of panel created/refreshed/collapsed/
//!   visibility/deleted events

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use axum::routing::get;
use axum::Router;
use std::convert::Infallible;
use std::sync::Arc;

use crate::state::AppState;

/// GET /api/events — SSE stream of all panel lifecycle events.
async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.events_tx.subscribe();

    let stream = async_stream::stream! {
        let mut rx = rx;
        while let Ok(event) = rx.recv().await {
            let json = serde_json::to_string(&event).unwrap_or_default();
            yield Ok(Event::default().data(json));
        }
    };

    Sse::new(stream)
}

/// Build the events router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/events", get(stream_events))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::PanelEvent;
    use crate::panels::test_support::scripted_state;

    #[test]
    fn test_router_creation() {
        // Smoke test: router should be constructable
        let _router = router();
    }

    #[tokio::test]
    async fn test_subscriber_receives_emitted_event() {
        let state = scripted_state();
        let mut rx = state.events_tx.subscribe();
        let id = uuid::Uuid::new_v4();
        state.emit(PanelEvent::now(id, "created"));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.panel_id, id);
        assert_eq!(event.event, "created");
    }
}
