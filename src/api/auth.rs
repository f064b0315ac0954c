//! Session endpoints
//!
//! - `POST /api/login` - Forward credentials upstream, set `auth_token`
//! - `POST /api/logout` - Clear `auth_token`
//! - `GET /api/session` - Report cookie presence
//! - `GET /api/debug` - Cookie diagnostics (never the token itself)

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Uri},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::DashboardError;
use crate::session::{self, clear_session_cookie, session_cookie, token_from_jar};
use crate::upstream::Credentials;

/// Login request
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub two_factor_code: Option<String>,
    #[serde(default)]
    pub two_factor_recovery_code: Option<String>,
}

impl LoginRequest {
    /// Validate required fields; both email and password must be non-empty.
    pub fn into_credentials(self) -> Result<Credentials, DashboardError> {
        match (self.email, self.password) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Ok(Credentials {
                    email,
                    password,
                    two_factor_code: self.two_factor_code,
                    two_factor_recovery_code: self.two_factor_recovery_code,
                })
            }
            _ => Err(DashboardError::BadRequest("Missing credentials".into())),
        }
    }
}

/// `{"success": true}`
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Session query response
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub authenticated: bool,
}

/// Debug response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugResponse {
    pub has_token: bool,
    pub token_length: usize,
    pub all_cookie_names: Vec<String>,
    pub environment: String,
    pub timestamp: String,
}

/// Login handler
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    uri: Uri,
    body: Bytes,
) -> Result<(CookieJar, Json<SuccessResponse>), DashboardError> {
    let request: LoginRequest = serde_json::from_slice(&body)
        .map_err(|_| DashboardError::BadRequest("Invalid JSON body".into()))?;

    let credentials = request.into_credentials().inspect_err(|_| {
        tracing::info!("Login rejected - missing credentials");
    })?;

    let token = state.upstream.login(&credentials).await?;

    let secure = session::is_secure_request(&headers, &uri);
    tracing::info!(secure, "Login succeeded - setting session cookie");

    Ok((
        jar.add(session_cookie(&token, secure)),
        Json(SuccessResponse { success: true }),
    ))
}

/// Logout handler
pub async fn logout_handler(jar: CookieJar) -> (CookieJar, Json<SuccessResponse>) {
    tracing::info!("Logout - clearing session cookie");
    (
        jar.add(clear_session_cookie()),
        Json(SuccessResponse { success: true }),
    )
}

/// Session handler
pub async fn session_handler(jar: CookieJar) -> Json<SessionResponse> {
    let authenticated = token_from_jar(&jar).is_some();
    tracing::debug!(authenticated, "Session check");
    Json(SessionResponse { authenticated })
}

/// Debug handler
pub async fn debug_handler(State(state): State<AppState>, jar: CookieJar) -> Json<DebugResponse> {
    let token = token_from_jar(&jar);

    Json(DebugResponse {
        has_token: token.is_some(),
        token_length: token.map(|t| t.len()).unwrap_or(0),
        all_cookie_names: session::cookie_names(&jar),
        environment: state.config.environment.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_require_email_and_password() {
        let missing_password = LoginRequest {
            email: Some("ops@example.com".into()),
            ..Default::default()
        };
        assert!(matches!(
            missing_password.into_credentials(),
            Err(DashboardError::BadRequest(_))
        ));

        let empty_email = LoginRequest {
            email: Some(String::new()),
            password: Some("secret".into()),
            ..Default::default()
        };
        assert!(empty_email.into_credentials().is_err());
    }

    #[test]
    fn test_credentials_keep_two_factor_fields() {
        let request: LoginRequest = serde_json::from_str(
            r#"{"email":"ops@example.com","password":"secret","twoFactorCode":"123456"}"#,
        )
        .unwrap();

        let creds = request.into_credentials().unwrap();
        assert_eq!(creds.two_factor_code.as_deref(), Some("123456"));
        assert!(creds.two_factor_recovery_code.is_none());
    }
}
