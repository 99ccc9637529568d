// crates/core/src/error.rs
use thiserror::Error;

use crate::transport::TransportError;
use houseview_types::TimeSpanError;

/// Errors a panel fetch can end in.
///
/// The three variants map to the three user-facing outcomes: `Cancelled` is
/// swallowed (loading cleared, nothing shown), `Query` lands in the panel's
/// error state, `Config` is raised before any request is issued.
#[derive(Debug, Error)]
pub enum PanelError {
    #[error("query cancelled")]
    Cancelled,

    #[error("{0}")]
    Query(String),

    #[error("{0}")]
    Config(String),
}

impl PanelError {
    pub fn no_query() -> Self {
        Self::Config("No query defined".to_string())
    }

    pub fn no_connection() -> Self {
        Self::Config("No connection selected".to_string())
    }

    /// Cancellation is silent: supersession, unmount, or an upstream error
    /// message that is itself about an aborted request.
    pub fn is_cancellation(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::Query(msg) => {
                let m = msg.to_ascii_lowercase();
                m.contains("cancel") || m.contains("abort")
            }
            Self::Config(_) => false,
        }
    }
}

impl From<TransportError> for PanelError {
    fn from(err: TransportError) -> Self {
        if err.is_cancelled() {
            Self::Cancelled
        } else {
            Self::Query(err.to_string())
        }
    }
}

impl From<TimeSpanError> for PanelError {
    fn from(err: TimeSpanError) -> Self {
        Self::Config(err.to_string())
    }
}
