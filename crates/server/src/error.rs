// crates/server/src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use houseview_core::PanelError;
use houseview_types::TimeSpanError;

/// Structured JSON error response for API errors.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// API error types that map to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Panel not found: {0}")]
    PanelNotFound(Uuid),

    #[error(transparent)]
    Panel(#[from] PanelError),

    #[error("Invalid time span: {0}")]
    TimeSpan(#[from] TimeSpanError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            ApiError::PanelNotFound(id) => {
                tracing::warn!(panel = %id, "panel not found");
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::with_details("Panel not found", format!("Panel ID: {id}")),
                )
            }
            ApiError::Panel(panel_err) => match panel_err {
                PanelError::Config(msg) => {
                    tracing::warn!(message = %msg, "panel configuration error");
                    (
                        StatusCode::BAD_REQUEST,
                        ErrorResponse::with_details("Configuration error", msg.clone()),
                    )
                }
                PanelError::Query(msg) => {
                    tracing::error!(message = %msg, "upstream query error");
                    (
                        StatusCode::BAD_GATEWAY,
                        ErrorResponse::with_details("Query failed", msg.clone()),
                    )
                }
                PanelError::Cancelled => {
                    tracing::debug!("query cancelled");
                    (StatusCode::CONFLICT, ErrorResponse::new("Query cancelled"))
                }
            },
            ApiError::TimeSpan(err) => {
                tracing::warn!(error = %err, "invalid time span");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::with_details("Invalid time span", err.to_string()),
                )
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!(message = %msg, "bad request");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::with_details("Bad request", msg.clone()),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(message = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Internal server error"),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
