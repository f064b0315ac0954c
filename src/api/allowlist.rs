//! Allowlist API

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use super::AppState;
use crate::error::DashboardError;
use crate::session::SessionToken;

/// Add-to-allowlist request
#[derive(Debug, Default, Deserialize)]
pub struct AddAllowlistRequest {
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// GET /api/allowlist
pub async fn list_allowlist(
    State(state): State<AppState>,
    token: SessionToken,
) -> Result<Json<Value>, DashboardError> {
    Ok(Json(state.upstream.allowlist(token.as_str()).await?))
}

/// POST /api/allowlist
pub async fn add_allowlist(
    State(state): State<AppState>,
    token: SessionToken,
    body: Bytes,
) -> Result<Json<Value>, DashboardError> {
    if !state.upstream.is_configured() {
        return Err(DashboardError::NotConfigured);
    }

    let request: AddAllowlistRequest = serde_json::from_slice(&body)
        .map_err(|_| DashboardError::BadRequest("Invalid JSON body".into()))?;

    let ip = request
        .ip
        .as_deref()
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .ok_or_else(|| DashboardError::BadRequest("IP address is required".into()))?;

    let created = state
        .upstream
        .add_allowlist(token.as_str(), ip, request.reason.as_deref())
        .await?;

    tracing::info!(ip = %ip, "Allowlist entry added");
    Ok(Json(created))
}

/// DELETE /api/allowlist/{ip}
pub async fn remove_allowlist(
    State(state): State<AppState>,
    token: SessionToken,
    Path(ip): Path<String>,
) -> Result<Json<Value>, DashboardError> {
    let removed = state.upstream.remove_allowlist(token.as_str(), &ip).await?;
    tracing::info!(ip = %ip, "Allowlist entry removed");
    Ok(Json(removed))
}
