//! SecOps Dashboard
//!
//! Browser-facing dashboard for an upstream security API (alerts, decisions,
//! allowlist, statistics).
//!
//! # Architecture
//!
//! ```text
//! Browser ──► Gate ──► Page / API handler ──► UpstreamClient ──► Security API
//!              │              │
//!              │              └── Bearer token from `auth_token` cookie
//!              └── Cookie presence only; redirects to /login?next=...
//! ```
//!
//! The dashboard keeps no server-side session. The upstream access token
//! lives in an HTTP-only cookie and is forwarded as a bearer credential;
//! the upstream API is the only place it is validated.

pub mod api;
pub mod config;
pub mod error;
pub mod gate;
pub mod insights;
pub mod records;
pub mod server;
pub mod session;
pub mod upstream;

pub use api::{api_router, AppState};
pub use config::DashboardConfig;
pub use error::DashboardError;
pub use gate::{decide, GateDecision};
pub use insights::{AlertInsights, DecisionFilter, DecisionView};
pub use records::{Alert, AllowlistEntry, Decision, DecisionId, Statistics};
pub use server::{build_router, DashboardServer};
pub use session::{SessionToken, AUTH_COOKIE};
pub use upstream::{Credentials, UpstreamClient};
