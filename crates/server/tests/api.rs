//! Integration tests for the panel API.
//!
//! Drives the whole stack — router, state, fetcher, refresh controller —
//! against a scripted in-memory transport, so every refresh outcome is
//! deterministic.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum_test::TestServer;
use serde_json::{json, Value};

use houseview_core::{
    ConnectionStore, PendingQuery, QueryResponse, QueryTransport, TransportError,
};
use houseview_server::{create_app, AppState};
use houseview_types::{ConnectionConfig, QuerySettings};

/// Transport that replays queued bodies and records every SQL it is handed.
#[derive(Default)]
struct ScriptedTransport {
    calls: AtomicUsize,
    sqls: Mutex<Vec<String>>,
    replies: Mutex<VecDeque<Result<String, String>>>,
}

impl ScriptedTransport {
    fn push_body(&self, body: &str) {
        self.replies.lock().unwrap().push_back(Ok(body.to_string()));
    }

    fn push_error(&self, message: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn sqls(&self) -> Vec<String> {
        self.sqls.lock().unwrap().clone()
    }
}

impl QueryTransport for ScriptedTransport {
    fn query(&self, sql: &str, _settings: &QuerySettings) -> PendingQuery {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sqls.lock().unwrap().push(sql.to_string());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(r#"{"meta": [], "data": []}"#.to_string()));
        PendingQuery {
            response: Box::pin(async move {
                match reply {
                    Ok(body) => Ok(QueryResponse::new(body.into_bytes())),
                    Err(message) => Err(TransportError::Query(message)),
                }
            }),
            abort: tokio_util::sync::CancellationToken::new(),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn server_with(transport: Arc<ScriptedTransport>) -> TestServer {
    let store = ConnectionStore::with_connection(ConnectionConfig::new(
        "local",
        "http://localhost:8123",
    ));
    let state = AppState::new(Arc::new(store), transport, "UTC");
    TestServer::new(create_app(state, None)).expect("test server")
}

fn one_row_body() -> &'static str {
    r#"{"meta": [{"name": "n", "type": "UInt64"}], "data": [{"n": "42"}], "rows": 1}"#
}

#[tokio::test]
async fn test_health_reports_ok() {
    let server = server_with(Arc::new(ScriptedTransport::default()));
    let response = server.get("/api/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_panel_lifecycle_create_refresh_delete() {
    let transport = Arc::new(ScriptedTransport::default());
    transport.push_body(one_row_body());
    let server = server_with(transport.clone());

    let created = server
        .post("/api/panels")
        .json(&json!({
            "id": "counter",
            "title": "Counter",
            "query": "SELECT count() AS n FROM system.query_log",
            "kind": "stat"
        }))
        .await;
    created.assert_status_ok();
    let panel: Value = created.json();
    let id = panel["id"].as_str().unwrap().to_string();

    let refreshed = server
        .post(&format!("/api/panels/{id}/refresh"))
        .json(&json!({}))
        .await;
    refreshed.assert_status_ok();
    let body: Value = refreshed.json();
    assert_eq!(body["outcome"], "fetched");
    assert_eq!(transport.calls(), 1);

    let got = server.get(&format!("/api/panels/{id}")).await;
    got.assert_status_ok();
    let state: Value = got.json();
    assert_eq!(state["data"]["kind"], "stat");
    assert_eq!(state["data"]["value"], 42.0);

    let deleted = server.delete(&format!("/api/panels/{id}")).await;
    deleted.assert_status_ok();
    server
        .get(&format!("/api/panels/{id}"))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_create_with_initial_options_fetches_immediately() {
    let transport = Arc::new(ScriptedTransport::default());
    transport.push_body(one_row_body());
    let server = server_with(transport.clone());

    let created = server
        .post("/api/panels")
        .json(&json!({
            "id": "eager",
            "title": "Eager",
            "query": "SELECT count() AS n FROM system.query_log",
            "kind": "stat",
            "initialOptions": {}
        }))
        .await;
    created.assert_status_ok();
    assert_eq!(transport.calls(), 1);

    let id = created.json::<Value>()["id"].as_str().unwrap().to_string();
    let state: Value = server.get(&format!("/api/panels/{id}")).await.json();
    assert_eq!(state["data"]["value"], 42.0);
}

#[tokio::test]
async fn test_refresh_dedup_and_force() {
    let transport = Arc::new(ScriptedTransport::default());
    let server = server_with(transport.clone());

    let created = server
        .post("/api/panels")
        .json(&json!({
            "id": "t", "title": "T", "query": "SELECT 1", "kind": "table"
        }))
        .await;
    let id = created.json::<Value>()["id"].as_str().unwrap().to_string();
    let refresh_url = format!("/api/panels/{id}/refresh");

    let first: Value = server.post(&refresh_url).json(&json!({})).await.json();
    assert_eq!(first["outcome"], "fetched");

    let second: Value = server.post(&refresh_url).json(&json!({})).await.json();
    assert_eq!(second["outcome"], "deduplicated");
    assert_eq!(transport.calls(), 1);

    let forced: Value = server
        .post(&refresh_url)
        .json(&json!({ "forceRefresh": true }))
        .await
        .json();
    assert_eq!(forced["outcome"], "fetched");
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_time_span_placeholders_are_substituted() {
    let transport = Arc::new(ScriptedTransport::default());
    let server = server_with(transport.clone());

    let created = server
        .post("/api/panels")
        .json(&json!({
            "id": "spanned",
            "title": "Spanned",
            "query": "SELECT n FROM t WHERE ts >= toDateTime({startTimestamp:UInt32}) \
                      AND ts <= toDateTime({endTimestamp:UInt32})",
            "kind": "table"
        }))
        .await;
    let id = created.json::<Value>()["id"].as_str().unwrap().to_string();

    server
        .post(&format!("/api/panels/{id}/refresh"))
        .json(&json!({
            "selectedTimeSpan": {
                "startISO8601": "2026-08-01T00:00:00Z",
                "endISO8601": "2026-08-02T00:00:00Z"
            }
        }))
        .await
        .assert_status_ok();

    let sql = transport.sqls().pop().unwrap();
    assert!(!sql.contains("{startTimestamp:UInt32}"), "sql: {sql}");
    assert!(!sql.contains("{endTimestamp:UInt32}"), "sql: {sql}");
}

#[tokio::test]
async fn test_collapsed_panel_defers_then_expand_releases() {
    let transport = Arc::new(ScriptedTransport::default());
    let server = server_with(transport.clone());

    let created = server
        .post("/api/panels")
        .json(&json!({
            "id": "c", "title": "C", "query": "SELECT 1", "kind": "table"
        }))
        .await;
    let id = created.json::<Value>()["id"].as_str().unwrap().to_string();

    server
        .put(&format!("/api/panels/{id}/collapsed"))
        .json(&json!({ "collapsed": true }))
        .await
        .assert_status_ok();

    let deferred: Value = server
        .post(&format!("/api/panels/{id}/refresh"))
        .json(&json!({}))
        .await
        .json();
    assert_eq!(deferred["outcome"], "deferred");
    assert_eq!(transport.calls(), 0);

    let expanded: Value = server
        .put(&format!("/api/panels/{id}/collapsed"))
        .json(&json!({ "collapsed": false }))
        .await
        .json();
    assert_eq!(expanded["outcome"], "fetched");
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_server_pagination_appends_pages() {
    let transport = Arc::new(ScriptedTransport::default());
    // Full first page (page_size rows would be 2 here), then a short page.
    transport.push_body(
        r#"{"meta": [{"name": "n", "type": "UInt8"}], "data": [{"n": 1}, {"n": 2}]}"#,
    );
    transport.push_body(r#"{"meta": [{"name": "n", "type": "UInt8"}], "data": [{"n": 3}]}"#);
    let server = server_with(transport.clone());

    let created = server
        .post("/api/panels")
        .json(&json!({
            "id": "paged",
            "title": "Paged",
            "query": "SELECT n FROM t ORDER BY n",
            "kind": "table",
            "pagination": "server",
            "pageSize": 2
        }))
        .await;
    let id = created.json::<Value>()["id"].as_str().unwrap().to_string();

    let first: Value = server
        .post(&format!("/api/panels/{id}/refresh"))
        .json(&json!({}))
        .await
        .json();
    assert_eq!(first["outcome"], "fetched");

    let paged = server.post(&format!("/api/panels/{id}/page")).await;
    paged.assert_status_ok();

    let state: Value = server.get(&format!("/api/panels/{id}")).await.json();
    assert_eq!(state["visual"]["data"].as_array().unwrap().len(), 3);
    assert_eq!(state["hasMorePages"], false);

    let sqls = transport.sqls();
    assert!(sqls[0].contains("LIMIT 2 OFFSET 0"), "sql: {}", sqls[0]);
    assert!(sqls[1].contains("LIMIT 2 OFFSET 2"), "sql: {}", sqls[1]);
}

#[tokio::test]
async fn test_query_error_maps_to_visual_error() {
    let transport = Arc::new(ScriptedTransport::default());
    transport.push_error("Code: 60. DB::Exception: Table missing");
    let server = server_with(transport);

    let created = server
        .post("/api/panels")
        .json(&json!({
            "id": "bad", "title": "Bad", "query": "SELECT boom", "kind": "table"
        }))
        .await;
    let id = created.json::<Value>()["id"].as_str().unwrap().to_string();

    let refreshed: Value = server
        .post(&format!("/api/panels/{id}/refresh"))
        .json(&json!({}))
        .await
        .json();
    assert_eq!(refreshed["outcome"], "failed");
    assert!(refreshed["visual"]["error"]
        .as_str()
        .unwrap()
        .contains("Code: 60"));
}

#[tokio::test]
async fn test_panel_without_query_is_config_error() {
    let server = server_with(Arc::new(ScriptedTransport::default()));

    let created = server
        .post("/api/panels")
        .json(&json!({ "id": "empty", "title": "Empty", "kind": "table" }))
        .await;
    created.assert_status_ok();
    let id = created.json::<Value>()["id"].as_str().unwrap().to_string();

    let refreshed: Value = server
        .post(&format!("/api/panels/{id}/refresh"))
        .json(&json!({}))
        .await
        .json();
    assert_eq!(refreshed["outcome"], "failed");
    assert_eq!(refreshed["visual"]["error"], "No query defined");
}

#[tokio::test]
async fn test_dashboards_expose_descriptors() {
    let server = server_with(Arc::new(ScriptedTransport::default()));

    let list: Value = server.get("/api/dashboards").await.json();
    let first_id = list[0]["id"].as_str().unwrap().to_string();

    let board = server.get(&format!("/api/dashboards/{first_id}")).await;
    board.assert_status_ok();
    let body: Value = board.json();
    assert!(!body["panels"].as_array().unwrap().is_empty());
}
