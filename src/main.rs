//! SecOps Dashboard - Entry Point
//!
//! Options:
//! - --json-logs: JSON log output (for log shippers)
//! - --help / -h: usage

use secops_dashboard::{DashboardConfig, DashboardServer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Parse args
    let args: Vec<String> = std::env::args().collect();
    let json_logs = args.iter().any(|a| a == "--json-logs");
    let help_mode = args.iter().any(|a| a == "--help" || a == "-h");

    if help_mode {
        println!("SecOps Dashboard v{}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Usage: secops-dashboard [OPTIONS]");
        println!();
        println!("Options:");
        println!("  --json-logs        Log as JSON");
        println!("  --help, -h         Show this help");
        println!();
        println!("Environment variables:");
        println!("  API_BASE                Upstream security API base URL (required)");
        println!("  API_LOGIN_PATH          Upstream login path (default: /login)");
        println!("  DASHBOARD_BIND_ADDR     Listen address (default: 127.0.0.1)");
        println!("  DASHBOARD_PORT          Listen port (default: 3000)");
        println!("  DASHBOARD_CORS_ORIGINS  Comma-separated allowed origins");
        println!("  DASHBOARD_LOG_REQUESTS  Log every request (default: true)");
        println!("  APP_ENV                 Environment label (default: development)");
        println!("  RUST_LOG                Log filter (default: info)");
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(true)
            .init();
    }

    info!("SecOps Dashboard v{}", env!("CARGO_PKG_VERSION"));

    let config = DashboardConfig::from_env();
    DashboardServer::new(config).run().await
}
