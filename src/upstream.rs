//! Upstream security API client
//!
//! Thin wrapper around `reqwest`: builds endpoint URLs from the configured
//! base, attaches the operator's bearer token and maps non-success answers
//! to [`DashboardError::Upstream`] with the upstream status and raw body.

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use url::Url;

use crate::config::DashboardConfig;
use crate::error::DashboardError;
use crate::records::DecisionId;

/// Credentials forwarded to the upstream login endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub two_factor_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub two_factor_recovery_code: Option<String>,
}

#[derive(Debug, Serialize)]
struct AllowlistBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

/// Client for the upstream security API
#[derive(Clone)]
pub struct UpstreamClient {
    http: Client,
    base: Option<String>,
    login_path: String,
}

impl UpstreamClient {
    /// Create a client using the given HTTP client
    pub fn new(http: Client, base: Option<String>, login_path: impl Into<String>) -> Self {
        Self {
            http,
            base: base.map(|b| b.trim_end_matches('/').to_string()),
            login_path: login_path.into(),
        }
    }

    /// Create from config with a default HTTP client
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self::new(Client::new(), config.api_base.clone(), config.login_path.clone())
    }

    /// Whether a base URL is configured
    pub fn is_configured(&self) -> bool {
        self.base.is_some()
    }

    /// Build `{base}/{segments...}`; each segment is percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, DashboardError> {
        let base = self.base.as_deref().ok_or(DashboardError::NotConfigured)?;
        let mut url = Url::parse(base).map_err(|e| {
            tracing::error!(error = %e, base = %base, "API_BASE is not a valid URL");
            DashboardError::NotConfigured
        })?;

        url.path_segments_mut()
            .map_err(|_| DashboardError::NotConfigured)?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    /// `{base}{login_path}`, with the path kept verbatim (trailing slash and query included)
    pub fn login_url(&self) -> Result<Url, DashboardError> {
        let base = self.base.as_deref().ok_or(DashboardError::NotConfigured)?;
        let path = self.login_path.trim();
        let url = if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        };

        Url::parse(&url).map_err(|e| {
            tracing::error!(error = %e, url = %url, "Upstream login URL is invalid");
            DashboardError::NotConfigured
        })
    }

    fn authorized(&self, method: Method, url: Url, token: &str) -> RequestBuilder {
        self.http.request(method, url).bearer_auth(token)
    }

    /// Exchange credentials for an access token.
    pub async fn login(&self, credentials: &Credentials) -> Result<String, DashboardError> {
        let url = self.login_url()?;

        debug!(url = %url, two_factor = credentials.two_factor_code.is_some(), "Forwarding login");

        let response = self.http.post(url).json(credentials).send().await?;
        let status = response.status();
        let text = response.text().await?;
        let data: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

        info!(status = %status, "Upstream login answered");

        if !status.is_success() {
            let message = data
                .get("error")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .or_else(|| Some(text.clone()).filter(|t| !t.is_empty()))
                .unwrap_or_else(|| "Invalid credentials".to_string());
            return Err(DashboardError::LoginRejected(message));
        }

        data.get("accessToken")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .ok_or_else(|| {
                DashboardError::InvalidUpstreamResponse("No accessToken returned from API".into())
            })
    }

    /// `GET {base}/api/alerts?limit=N`
    pub async fn alerts(&self, token: &str, limit: &str) -> Result<Value, DashboardError> {
        let mut url = self.endpoint(&["api", "alerts"])?;
        url.query_pairs_mut().append_pair("limit", limit);
        send_json(self.authorized(Method::GET, url, token)).await
    }

    /// `GET {base}/api/decisions`
    pub async fn decisions(&self, token: &str) -> Result<Value, DashboardError> {
        let url = self.endpoint(&["api", "decisions"])?;
        send_json(self.authorized(Method::GET, url, token)).await
    }

    /// `DELETE {base}/decisions/{id}`
    pub async fn delete_decision(&self, token: &str, id: &DecisionId) -> Result<(), DashboardError> {
        let id = id.to_string();
        let url = self.endpoint(&["decisions", &id])?;
        let response = self.authorized(Method::DELETE, url, token).send().await?;
        check_status(response).await.map(|_| ())
    }

    /// `GET {base}/api/allowlist`
    pub async fn allowlist(&self, token: &str) -> Result<Value, DashboardError> {
        let url = self.endpoint(&["api", "allowlist"])?;
        send_json(self.authorized(Method::GET, url, token)).await
    }

    /// `POST {base}/api/allowlist/{ip}`
    pub async fn add_allowlist(
        &self,
        token: &str,
        ip: &str,
        reason: Option<&str>,
    ) -> Result<Value, DashboardError> {
        let url = self.endpoint(&["api", "allowlist", ip])?;
        let request = self
            .authorized(Method::POST, url, token)
            .json(&AllowlistBody { reason });
        send_json(request).await
    }

    /// `DELETE {base}/api/allowlist/{ip}`
    pub async fn remove_allowlist(&self, token: &str, ip: &str) -> Result<Value, DashboardError> {
        let url = self.endpoint(&["api", "allowlist", ip])?;
        send_json(self.authorized(Method::DELETE, url, token)).await
    }

    /// `GET {base}/api/statistics`
    pub async fn statistics(&self, token: &str) -> Result<Value, DashboardError> {
        let url = self.endpoint(&["api", "statistics"])?;
        send_json(self.authorized(Method::GET, url, token)).await
    }
}

/// Turn a non-success response into [`DashboardError::Upstream`].
async fn check_status(response: Response) -> Result<Response, DashboardError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await?;
    Err(DashboardError::Upstream { status, body })
}

/// Send, check the status and decode the JSON body.
///
/// An empty success body is reported as `{"success": true}`.
async fn send_json(request: RequestBuilder) -> Result<Value, DashboardError> {
    let response = check_status(request.send().await?).await?;
    let bytes = response.bytes().await?;

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({ "success": true }));
    }

    serde_json::from_slice(&bytes)
        .map_err(|_| DashboardError::InvalidUpstreamResponse("Invalid JSON from upstream".into()))
}
