//! Dashboard error type
//!
//! Every handler failure maps to a JSON body of the form `{"error": "..."}`.
//! Upstream failures keep the upstream status code and body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::records::DecisionId;

/// Message returned when the upstream base URL is missing
pub const NOT_CONFIGURED_MESSAGE: &str = "API_BASE is not configured";

/// Errors surfaced by the gate-protected API
#[derive(Debug, Error)]
pub enum DashboardError {
    /// No `auth_token` cookie on a protected handler
    #[error("Unauthorized")]
    Unauthorized,

    /// Upstream base URL missing or unusable
    #[error("API_BASE is not configured")]
    NotConfigured,

    /// Client sent an unusable request
    #[error("{0}")]
    BadRequest(String),

    /// Upstream refused the operator's credentials
    #[error("{0}")]
    LoginRejected(String),

    /// Upstream answered with a non-success status
    #[error("upstream returned {status}: {body}")]
    Upstream { status: StatusCode, body: String },

    /// Upstream answered successfully but not in the expected shape
    #[error("{0}")]
    InvalidUpstreamResponse(String),

    /// Network failure talking to the upstream
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A sequential bulk delete stopped at `failed_id`
    #[error("bulk delete failed at {failed_id}: {body}")]
    BulkDeleteFailed {
        failed_id: DecisionId,
        status: StatusCode,
        body: String,
    },
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(rename = "failedId", skip_serializing_if = "Option::is_none")]
    pub failed_id: Option<DecisionId>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            failed_id: None,
        }
    }
}

impl DashboardError {
    /// HTTP status this error is reported with
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized | Self::LoginRejected(_) => StatusCode::UNAUTHORIZED,
            Self::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream { status, .. } | Self::BulkDeleteFailed { status, .. } => *status,
            Self::InvalidUpstreamResponse(_) | Self::Transport(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            Self::NotConfigured => tracing::error!("Upstream API base is not configured"),
            Self::Transport(e) => tracing::error!(error = %e, "Upstream request failed"),
            Self::InvalidUpstreamResponse(msg) => {
                tracing::warn!(message = %msg, "Unexpected upstream response")
            }
            Self::Upstream { status, .. } => {
                tracing::warn!(status = %status, "Relaying upstream failure")
            }
            Self::BulkDeleteFailed { failed_id, status, .. } => {
                tracing::warn!(failed_id = %failed_id, status = %status, "Bulk delete aborted")
            }
            _ => {}
        }

        let body = match self {
            Self::Upstream { body, .. } => ErrorResponse::new(body),
            Self::BulkDeleteFailed { failed_id, body, .. } => ErrorResponse {
                error: body,
                failed_id: Some(failed_id),
            },
            Self::Transport(_) => ErrorResponse::new("Upstream request failed"),
            other => ErrorResponse::new(other.to_string()),
        };

        (status, Json(body)).into_response()
    }
}
