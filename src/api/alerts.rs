//! Alerts API

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use super::AppState;
use crate::error::DashboardError;
use crate::insights::AlertInsights;
use crate::records::{decode_list, Alert};
use crate::session::SessionToken;

/// Upstream page size when the caller gives none
pub const DEFAULT_ALERT_LIMIT: &str = "10";

/// Query parameters for the alerts endpoints
#[derive(Debug, Default, Deserialize)]
pub struct AlertsQuery {
    pub limit: Option<String>,
    #[serde(default)]
    pub search: String,
}

impl AlertsQuery {
    /// Limit passed through to upstream; empty means default
    pub fn limit(&self) -> &str {
        self.limit
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_ALERT_LIMIT)
    }
}

/// GET /api/alerts - relay upstream alerts
pub async fn list_alerts(
    State(state): State<AppState>,
    token: SessionToken,
    Query(query): Query<AlertsQuery>,
) -> Result<Json<Value>, DashboardError> {
    let body = state.upstream.alerts(token.as_str(), query.limit()).await?;
    Ok(Json(body))
}

/// GET /api/alerts/insights - top sources, ASNs, engines, scenarios and daily series
pub async fn alert_insights(
    State(state): State<AppState>,
    token: SessionToken,
    Query(query): Query<AlertsQuery>,
) -> Result<Json<AlertInsights>, DashboardError> {
    let body = state.upstream.alerts(token.as_str(), query.limit()).await?;
    let alerts: Vec<Alert> = decode_list(&body, "alerts");

    tracing::debug!(count = alerts.len(), "Building alert insights");

    Ok(Json(AlertInsights::build(
        alerts,
        &query.search,
        chrono::Utc::now(),
    )))
}
