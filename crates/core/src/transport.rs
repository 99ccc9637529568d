// crates/core/src/transport.rs
//! The query transport seam.
//!
//! The engine only depends on this shape: hand in SQL plus settings, get
//! back a response future and an abort token. The HTTP implementation lives
//! in `houseview-transport`; tests plug in scripted transports.

use bytes::Bytes;
use futures_util::future::BoxFuture;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use houseview_types::{QuerySettings, ResultSet};

/// Errors the transport reports.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request was aborted through the pending query's token.
    #[error("query cancelled")]
    Cancelled,

    /// The server rejected the query; carries the error payload text.
    #[error("{0}")]
    Query(String),

    /// The request itself failed (connect, timeout, body read).
    #[error("transport error: {0}")]
    Request(String),

    /// The response body did not parse as the expected envelope.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl TransportError {
    /// Cancellation in any spelling: the explicit variant, or an error
    /// message that is itself about an aborted request.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::Query(msg) | Self::Request(msg) | Self::Malformed(msg) => {
                let m = msg.to_ascii_lowercase();
                m.contains("cancel") || m.contains("abort")
            }
        }
    }
}

/// A raw successful response body, parsed on demand.
#[derive(Debug, Clone)]
pub struct QueryResponse {
    body: Bytes,
}

impl QueryResponse {
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self { body: body.into() }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Parse the body as the ClickHouse `FORMAT JSON` envelope.
    pub fn result_set(&self) -> Result<ResultSet, TransportError> {
        serde_json::from_slice(&self.body).map_err(|e| TransportError::Malformed(e.to_string()))
    }
}

/// An issued query: the response future plus the token that aborts it.
///
/// Cancelling `abort` must make `response` resolve promptly (with
/// [`TransportError::Cancelled`] or any error — the caller discards either
/// once it sees the token cancelled).
pub struct PendingQuery {
    pub response: BoxFuture<'static, Result<QueryResponse, TransportError>>,
    pub abort: CancellationToken,
}

/// Issues queries against one upstream server.
pub trait QueryTransport: Send + Sync {
    /// Start the query and return the in-flight handle. Must not block.
    fn query(&self, sql: &str, settings: &QuerySettings) -> PendingQuery;

    /// Transport name for logs ("http", "scripted", ...).
    fn name(&self) -> &str;
}
