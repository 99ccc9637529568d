// crates/transport/src/lib.rs
//! HTTP implementation of the query transport.
//!
//! Speaks the HTTP interface of ClickHouse-compatible servers: SQL in the
//! POST body, settings as query parameters, `default_format=JSON` so the
//! core can parse the result envelope. Cancellation races the request future
//! against the pending query's token; a cancelled token resolves the
//! response promptly with [`TransportError::Cancelled`].

use std::time::Duration;

use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;

use houseview_core::{PendingQuery, QueryResponse, QueryTransport, TransportError};
use houseview_types::{ConnectionConfig, QuerySettings};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Query transport over the ClickHouse HTTP interface.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    username: String,
    password: Option<String>,
}

impl HttpTransport {
    pub fn new(connection: &ConnectionConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(Self {
            client,
            url: connection.url.clone(),
            username: connection.username.clone(),
            password: connection.password.clone(),
        })
    }

    fn build_request(&self, sql: &str, settings: &QuerySettings) -> reqwest::RequestBuilder {
        let mut params: Vec<(String, String)> =
            vec![("default_format".to_string(), "JSON".to_string())];
        for (name, value) in settings.iter() {
            params.push((name.to_string(), value.to_string()));
        }
        self.client
            .post(&self.url)
            .query(&params)
            .basic_auth(&self.username, self.password.as_deref())
            .body(sql.to_string())
    }

    async fn send(
        request: reqwest::RequestBuilder,
    ) -> Result<QueryResponse, TransportError> {
        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        if status.is_success() {
            Ok(QueryResponse::new(body))
        } else {
            // ClickHouse puts the error text in the body ("Code: 62.
            // DB::Exception: …"); surface it as the query error payload.
            let text = String::from_utf8_lossy(&body).trim().to_string();
            let message = if text.is_empty() {
                format!("server returned {status}")
            } else {
                text
            };
            tracing::warn!(status = %status, "upstream rejected query");
            Err(classify_status(status, message))
        }
    }
}

fn classify_status(status: StatusCode, message: String) -> TransportError {
    // Anything the server said about the query itself is a query error;
    // infrastructure statuses (proxies, gateways) are transport failures.
    match status {
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            TransportError::Request(message)
        }
        _ => TransportError::Query(message),
    }
}

impl QueryTransport for HttpTransport {
    fn query(&self, sql: &str, settings: &QuerySettings) -> PendingQuery {
        let abort = CancellationToken::new();
        let token = abort.clone();
        let request = self.build_request(sql, settings);
        tracing::debug!(url = %self.url, bytes = sql.len(), "sending query");
        let response = Box::pin(async move {
            tokio::select! {
                _ = token.cancelled() => Err(TransportError::Cancelled),
                result = Self::send(request) => result,
            }
        });
        PendingQuery { response, abort }
    }

    fn name(&self) -> &str {
        "http"
    }
}
