//! Statistics & overview API

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use super::alerts::AlertsQuery;
use super::AppState;
use crate::error::DashboardError;
use crate::insights::{overview_cards, StatCard};
use crate::records::{decode_list, decode_statistics, Alert};
use crate::session::SessionToken;

/// Overview page payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewResponse {
    pub cards: Vec<StatCard>,
    pub recent_alerts: Vec<Alert>,
    /// Whether `recent_alerts` came from the statistics previews
    pub alerts_from_statistics: bool,
}

/// GET /api/statistics - relay upstream statistics
pub async fn statistics(
    State(state): State<AppState>,
    token: SessionToken,
) -> Result<Json<Value>, DashboardError> {
    Ok(Json(state.upstream.statistics(token.as_str()).await?))
}

/// GET /api/overview - stat cards plus recent alerts
///
/// Recent alerts come from the statistics previews when upstream provides
/// them, otherwise from the alerts endpoint with the requested limit.
pub async fn overview(
    State(state): State<AppState>,
    token: SessionToken,
    Query(query): Query<AlertsQuery>,
) -> Result<Json<OverviewResponse>, DashboardError> {
    let body = state.upstream.statistics(token.as_str()).await?;
    let stats = decode_statistics(&body);
    let cards = overview_cards(&stats);

    let (recent_alerts, alerts_from_statistics) = match stats.top_recent_alerts {
        Some(previews) => (
            previews
                .into_iter()
                .enumerate()
                .map(|(i, p)| p.into_alert(i))
                .collect(),
            true,
        ),
        None => {
            let alerts = state.upstream.alerts(token.as_str(), query.limit()).await?;
            (decode_list(&alerts, "alerts"), false)
        }
    };

    Ok(Json(OverviewResponse {
        cards,
        recent_alerts,
        alerts_from_statistics,
    }))
}
