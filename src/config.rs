//! Dashboard Configuration
//!
//! Environment-driven configuration with localhost-first defaults.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Default upstream login path
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Dashboard server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Bind address (default: 127.0.0.1)
    pub bind_addr: IpAddr,
    /// Port number (default: 3000)
    pub port: u16,
    /// Upstream security API base URL. `None` is reported per request.
    pub api_base: Option<String>,
    /// Upstream login path appended to `api_base`
    pub login_path: String,
    /// Allowed CORS origins
    pub cors_origins: Vec<String>,
    /// Enable request logging
    pub log_requests: bool,
    /// Deployment environment label
    pub environment: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
            api_base: None,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            log_requests: true,
            environment: "development".to_string(),
        }
    }
}

impl DashboardConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("DASHBOARD_BIND_ADDR") {
            match addr.parse() {
                Ok(parsed) => config.bind_addr = parsed,
                Err(_) => tracing::warn!(value = %addr, "Ignoring invalid DASHBOARD_BIND_ADDR"),
            }
        }

        if let Some(port) = lookup("DASHBOARD_PORT") {
            match port.parse() {
                Ok(parsed) => config.port = parsed,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid DASHBOARD_PORT"),
            }
        }

        config.api_base = lookup("API_BASE")
            .or_else(|| lookup("PUBLIC_API_BASE"))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        if let Some(path) = lookup("API_LOGIN_PATH").filter(|p| !p.trim().is_empty()) {
            config.login_path = path.trim().to_string();
        }

        if let Some(origins) = lookup("DASHBOARD_CORS_ORIGINS") {
            config.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(val) = lookup("DASHBOARD_LOG_REQUESTS") {
            config.log_requests = val == "true" || val == "1";
        }

        if let Some(env) = lookup("APP_ENV") {
            config.environment = env;
        }

        if config.api_base.is_none() {
            tracing::warn!("API_BASE is not configured - upstream requests will fail");
        }

        config
    }

    /// Check if bound to localhost only
    pub fn is_localhost(&self) -> bool {
        self.bind_addr.is_loopback()
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    /// Get the base URL for this server
    pub fn base_url(&self) -> String {
        // HTTPS is terminated by the reverse proxy
        format!("http://{}:{}", self.bind_addr, self.port)
    }

    /// Config pointing at an upstream, otherwise default
    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        Self {
            api_base: Some(api_base.into()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_is_localhost() {
        let config = DashboardConfig::default();
        assert!(config.is_localhost());
        assert_eq!(config.port, 3000);
        assert!(config.api_base.is_none());
        assert_eq!(config.login_path, "/login");
    }

    #[test]
    fn test_api_base_fallback_variable() {
        let config = DashboardConfig::from_lookup(lookup_from(&[(
            "PUBLIC_API_BASE",
            "https://lapi.example.com",
        )]));
        assert_eq!(config.api_base.as_deref(), Some("https://lapi.example.com"));

        let config = DashboardConfig::from_lookup(lookup_from(&[
            ("API_BASE", "https://primary.example.com"),
            ("PUBLIC_API_BASE", "https://secondary.example.com"),
        ]));
        assert_eq!(config.api_base.as_deref(), Some("https://primary.example.com"));
    }

    #[test]
    fn test_empty_api_base_is_unset() {
        let config = DashboardConfig::from_lookup(lookup_from(&[("API_BASE", "  ")]));
        assert!(config.api_base.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = DashboardConfig::from_lookup(lookup_from(&[
            ("DASHBOARD_BIND_ADDR", "0.0.0.0"),
            ("DASHBOARD_PORT", "8443"),
            ("API_LOGIN_PATH", "/api/auth/login"),
            ("DASHBOARD_CORS_ORIGINS", "https://a.example, https://b.example,"),
            ("DASHBOARD_LOG_REQUESTS", "0"),
            ("APP_ENV", "production"),
        ]));

        assert!(!config.is_localhost());
        assert_eq!(config.port, 8443);
        assert_eq!(config.login_path, "/api/auth/login");
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert!(!config.log_requests);
        assert_eq!(config.environment, "production");
    }

    #[test]
    fn test_invalid_port_keeps_default() {
        let config = DashboardConfig::from_lookup(lookup_from(&[("DASHBOARD_PORT", "http")]));
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_base_url() {
        let config = DashboardConfig::default();
        assert_eq!(config.base_url(), "http://127.0.0.1:3000");
        assert_eq!(config.socket_addr().port(), 3000);
    }
}
