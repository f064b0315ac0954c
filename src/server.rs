//! Dashboard HTTP Server
//!
//! Axum server with embedded pages, the session gate in front of every
//! route, CORS, request tracing and graceful shutdown.

use crate::api::{api_router, AppState};
use crate::config::DashboardConfig;
use crate::gate::gate_middleware;
use axum::{
    body::Body,
    extract::Path,
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use rust_embed::Embed;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Embedded pages and assets
#[derive(Embed)]
#[folder = "src/static/"]
struct StaticAssets;

/// Dashboard server
pub struct DashboardServer {
    state: AppState,
}

impl DashboardServer {
    /// Create a new dashboard server with the given configuration
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }

    /// Build the router with all routes and middleware
    pub fn build_router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Start the server and run until shutdown signal
    pub async fn run(self) -> anyhow::Result<()> {
        let config = self.state.config.clone();
        let addr = config.socket_addr();
        let router = self.build_router();

        info!("Starting dashboard server on {}", addr);

        match &config.api_base {
            Some(base) => info!("Proxying to upstream API at {}", base),
            None => warn!("API_BASE is not configured - data endpoints will return 500"),
        }

        if !config.is_localhost() {
            warn!(
                "Dashboard bound to {} - terminate TLS in front of it so session cookies are marked Secure",
                addr
            );
        }

        info!("Dashboard available at {}", config.base_url());

        let listener = tokio::net::TcpListener::bind(addr).await?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Dashboard server shut down gracefully");
        Ok(())
    }
}

/// Build the full application router for `state`.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .cors_origins
                .iter()
                .filter_map(|o| o.parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        )
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    let log_requests = state.config.log_requests;

    let mut router = Router::new()
        // Pages
        .route("/", get(dashboard_page))
        .route("/alerts", get(dashboard_page))
        .route("/decisions", get(dashboard_page))
        .route("/allowlist", get(dashboard_page))
        .route("/settings", get(dashboard_page))
        .route("/login", get(login_page))
        .route("/favicon.ico", get(favicon))
        .route("/static/{*path}", get(static_handler))
        // API
        .nest("/api", api_router(state))
        .fallback(not_found)
        // Gate runs before every handler, fallback included
        .layer(middleware::from_fn(gate_middleware))
        .layer(cors);

    if log_requests {
        router = router.layer(TraceLayer::new_for_http());
    }

    router
}

fn embedded_html(name: &str) -> Response {
    match StaticAssets::get(name) {
        Some(content) => Html(content.data.into_owned()).into_response(),
        None => Html(FALLBACK_PAGE).into_response(),
    }
}

/// Serve the dashboard shell
async fn dashboard_page() -> Response {
    embedded_html("index.html")
}

/// Serve the login page
async fn login_page() -> Response {
    embedded_html("login.html")
}

async fn favicon() -> Response {
    serve_asset("favicon.svg")
}

/// Serve static files from embedded assets
async fn static_handler(Path(path): Path<String>) -> Response {
    let path = path.trim_start_matches('/');

    // Security: prevent path traversal
    if path.contains("..") {
        return StatusCode::BAD_REQUEST.into_response();
    }

    serve_asset(path)
}

fn serve_asset(path: &str) -> Response {
    let Some(content) = StaticAssets::get(path) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let mime = mime_guess::from_path(path).first_or_octet_stream().to_string();

    (
        [
            (header::CONTENT_TYPE, mime),
            (header::CACHE_CONTROL, "public, max-age=3600".to_string()),
        ],
        Body::from(content.data.into_owned()),
    )
        .into_response()
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

/// Fallback page when an embedded page is missing
const FALLBACK_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>SecOps Dashboard</title>
</head>
<body>
    <h1>SecOps Dashboard</h1>
    <p>The dashboard UI is not installed.</p>
</body>
</html>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> Router {
        DashboardServer::new(DashboardConfig::default()).build_router()
    }

    async fn send_get(app: Router, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint_is_public() {
        let response = send_get(app(), "/api/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["status"], "ok");
        assert!(json["version"].is_string());
        assert_eq!(json["upstream_configured"], false);
    }

    #[tokio::test]
    async fn test_index_requires_session() {
        let response = send_get(app(), "/", None).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/login?next=%2F");
    }

    #[tokio::test]
    async fn test_index_returns_html_with_session() {
        let response = send_get(app(), "/", Some("auth_token=abc")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8_lossy(&body);
        assert!(html.contains("<!DOCTYPE html>"));
        assert!(html.contains("SecOps Dashboard"));
    }

    #[tokio::test]
    async fn test_login_page_is_public() {
        let response = send_get(app(), "/login", None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_static_asset_served_with_mime() {
        let response = send_get(app(), "/static/app.css", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");
    }

    #[tokio::test]
    async fn test_path_traversal_blocked() {
        let response = send_get(app(), "/static/..%2F..%2Fetc%2Fpasswd", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_file_returns_404() {
        let response = send_get(app(), "/static/nonexistent.js", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_route_is_gated_then_404() {
        let response = send_get(app(), "/nope", None).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

        let response = send_get(app(), "/nope", Some("auth_token=abc")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
