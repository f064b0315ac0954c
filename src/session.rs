//! Session cookie handling
//!
//! The session is nothing more than the opaque upstream token stored in an
//! HTTP-only cookie. Presence of a non-empty `auth_token` cookie is the only
//! authentication signal; the token is never validated locally.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, Uri},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::error::DashboardError;

/// Cookie name for the upstream access token
pub const AUTH_COOKIE: &str = "auth_token";

/// Session cookie lifetime (7 days)
pub const SESSION_MAX_AGE_DAYS: i64 = 7;

/// Build the session cookie carrying `token`
pub fn session_cookie(token: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(cookie::time::Duration::days(SESSION_MAX_AGE_DAYS))
        .build()
}

/// Build the removal cookie used on logout
pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(cookie::time::Duration::ZERO)
        .build()
}

/// Token from the jar, if present and non-empty
pub fn token_from_jar(jar: &CookieJar) -> Option<String> {
    jar.get(AUTH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// Token from raw request headers
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    token_from_jar(&CookieJar::from_headers(headers))
}

/// Whether the request reached us over TLS, directly or via a proxy.
pub fn is_secure_request(headers: &HeaderMap, uri: &Uri) -> bool {
    if uri.scheme_str() == Some("https") {
        return true;
    }

    headers
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|proto| proto.trim().eq_ignore_ascii_case("https"))
        .unwrap_or(false)
}

/// Names of every cookie in the jar, sorted
pub fn cookie_names(jar: &CookieJar) -> Vec<String> {
    let mut names: Vec<String> = jar.iter().map(|c| c.name().to_string()).collect();
    names.sort();
    names
}

/// Request-scoped bearer token for protected handlers.
///
/// Extraction fails with [`DashboardError::Unauthorized`] when the cookie is
/// missing or empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(pub String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = DashboardError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        token_from_headers(&parts.headers)
            .map(SessionToken)
            .ok_or(DashboardError::Unauthorized)
    }
}
