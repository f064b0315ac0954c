//! Decisions API
//!
//! Bulk delete is a loop of single deletes against upstream. The first
//! failure stops the loop; earlier deletes are not rolled back.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::AppState;
use crate::error::DashboardError;
use crate::insights::{DecisionFilter, DecisionView, DEFAULT_VISIBLE};
use crate::records::{decode_list, Decision, DecisionId};
use crate::session::SessionToken;

/// Bulk delete request
#[derive(Debug, Default, Deserialize)]
pub struct BulkDeleteRequest {
    #[serde(default)]
    pub ids: Option<Vec<DecisionId>>,
}

/// Bulk delete response
#[derive(Debug, Serialize)]
pub struct BulkDeleteResponse {
    pub success: bool,
    pub count: usize,
}

/// Query parameters for the decisions view
#[derive(Debug, Default, Deserialize)]
pub struct DecisionViewQuery {
    #[serde(default)]
    pub search: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub status: Option<String>,
    pub visible: Option<usize>,
}

/// GET /api/decisions - relay upstream decisions
pub async fn list_decisions(
    State(state): State<AppState>,
    token: SessionToken,
) -> Result<Json<Value>, DashboardError> {
    Ok(Json(state.upstream.decisions(token.as_str()).await?))
}

/// GET /api/decisions/view - filtered decisions with a "load more" window
pub async fn decision_view(
    State(state): State<AppState>,
    token: SessionToken,
    Query(query): Query<DecisionViewQuery>,
) -> Result<Json<DecisionView>, DashboardError> {
    let body = state.upstream.decisions(token.as_str()).await?;
    let decisions: Vec<Decision> = decode_list(&body, "decisions");

    let filter = DecisionFilter {
        search: query.search,
        kind: query.kind,
        status: query.status,
    };
    let visible = query.visible.unwrap_or(DEFAULT_VISIBLE);

    Ok(Json(DecisionView::build(decisions, &filter, visible)))
}

/// DELETE /api/decisions/{id}
pub async fn delete_decision(
    State(state): State<AppState>,
    token: SessionToken,
    Path(id): Path<String>,
) -> Result<Json<Value>, DashboardError> {
    let id = DecisionId::Text(id);
    state.upstream.delete_decision(token.as_str(), &id).await?;
    tracing::info!(id = %id, "Decision deleted");
    Ok(Json(json!({ "success": true })))
}

/// POST /api/decisions/bulk-delete
pub async fn bulk_delete(
    State(state): State<AppState>,
    token: SessionToken,
    body: Bytes,
) -> Result<Json<BulkDeleteResponse>, DashboardError> {
    if !state.upstream.is_configured() {
        return Err(DashboardError::NotConfigured);
    }

    // Unparsable bodies are treated like a missing ids list
    let request: BulkDeleteRequest = serde_json::from_slice(&body).unwrap_or_default();
    let ids = request
        .ids
        .filter(|ids| !ids.is_empty())
        .ok_or_else(|| DashboardError::BadRequest("ids array required".into()))?;

    for id in &ids {
        match state.upstream.delete_decision(token.as_str(), id).await {
            Ok(()) => tracing::debug!(id = %id, "Bulk delete step succeeded"),
            Err(DashboardError::Upstream { status, body }) => {
                return Err(DashboardError::BulkDeleteFailed {
                    failed_id: id.clone(),
                    status,
                    body,
                });
            }
            Err(DashboardError::Transport(e)) => {
                return Err(DashboardError::BulkDeleteFailed {
                    failed_id: id.clone(),
                    status: axum::http::StatusCode::BAD_GATEWAY,
                    body: format!("Upstream request failed: {e}"),
                });
            }
            Err(other) => return Err(other),
        }
    }

    tracing::info!(count = ids.len(), "Bulk delete completed");

    Ok(Json(BulkDeleteResponse {
        success: true,
        count: ids.len(),
    }))
}
