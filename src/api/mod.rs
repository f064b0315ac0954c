//! Dashboard API Endpoints
//!
//! Routes (all under `/api`):
//! - POST   /login                  - Exchange credentials for the session cookie
//! - POST   /logout                 - Clear the session cookie
//! - GET    /session                - Cookie presence check
//! - GET    /debug                  - Cookie diagnostics
//! - GET    /health, /healthz, /readyz
//! - GET    /alerts                 - Proxy
//! - GET    /alerts/insights        - Breakdowns for the alerts page
//! - GET    /decisions              - Proxy
//! - GET    /decisions/view         - Filtered decisions with "load more"
//! - DELETE /decisions/{id}         - Proxy
//! - POST   /decisions/bulk-delete  - Sequential deletes, first failure wins
//! - GET    /allowlist              - Proxy
//! - POST   /allowlist              - Proxy
//! - DELETE /allowlist/{ip}         - Proxy
//! - GET    /statistics             - Proxy
//! - GET    /overview               - Stat cards and recent alerts

pub mod alerts;
pub mod allowlist;
pub mod auth;
pub mod decisions;
pub mod health;
pub mod statistics;

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;

use crate::config::DashboardConfig;
use crate::upstream::UpstreamClient;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<DashboardConfig>,
    /// Upstream security API client
    pub upstream: UpstreamClient,
    /// Server start time for uptime calculation
    pub start_time: Instant,
    /// Application version
    pub version: &'static str,
}

impl AppState {
    /// Create state with a default HTTP client
    pub fn new(config: DashboardConfig) -> Self {
        let upstream = UpstreamClient::from_config(&config);
        Self::with_upstream(config, upstream)
    }

    /// Create state around an existing upstream client
    pub fn with_upstream(config: DashboardConfig, upstream: UpstreamClient) -> Self {
        Self {
            config: Arc::new(config),
            upstream,
            start_time: Instant::now(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// Create the API router (mounted under `/api`)
pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Session
        .route("/login", post(auth::login_handler))
        .route("/logout", post(auth::logout_handler))
        .route("/session", get(auth::session_handler))
        .route("/debug", get(auth::debug_handler))
        // Health
        .route("/health", get(health::health_check))
        .route("/healthz", get(health::liveness))
        .route("/readyz", get(health::readiness))
        // Alerts
        .route("/alerts", get(alerts::list_alerts))
        .route("/alerts/insights", get(alerts::alert_insights))
        // Decisions
        .route("/decisions", get(decisions::list_decisions))
        .route("/decisions/view", get(decisions::decision_view))
        .route("/decisions/bulk-delete", post(decisions::bulk_delete))
        .route("/decisions/{id}", delete(decisions::delete_decision))
        // Allowlist
        .route(
            "/allowlist",
            get(allowlist::list_allowlist).post(allowlist::add_allowlist),
        )
        .route("/allowlist/{ip}", delete(allowlist::remove_allowlist))
        // Statistics
        .route("/statistics", get(statistics::statistics))
        .route("/overview", get(statistics::overview))
        .with_state(state)
}
