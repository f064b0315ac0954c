//! Edge gate
//!
//! Runs in front of every route. The decision is a pure function of the
//! request path, its query string and whether a session cookie is present:
//!
//! - public prefixes pass through untouched
//! - `/login` with a session bounces to `next` (default `/`)
//! - everything else without a session is sent to `/login?next=<path>`

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::session::token_from_headers;

/// Login page path
pub const LOGIN_PATH: &str = "/login";

/// Landing page for authenticated users leaving `/login`
pub const DEFAULT_LANDING: &str = "/";

/// Return-to query parameter
pub const NEXT_PARAM: &str = "next";

/// Path prefixes that never require a session
pub const PUBLIC_PREFIXES: &[&str] = &[
    "/login",
    "/static",
    "/favicon.ico",
    "/api/login",
    "/api/logout",
    "/api/session",
    "/api/debug",
    "/api/health",
    "/api/readyz",
];

/// Outcome of the gate for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Let the request reach its handler
    Pass,
    /// No session: send to the login page
    RedirectToLogin { location: String },
    /// Already signed in on the login page: send to the return target
    RedirectTo { location: String },
}

/// Decide what to do with a request.
pub fn decide(path: &str, query: Option<&str>, has_token: bool) -> GateDecision {
    if PUBLIC_PREFIXES.iter().any(|p| path.starts_with(p)) {
        if path == LOGIN_PATH && has_token {
            return GateDecision::RedirectTo {
                location: return_target(query),
            };
        }
        return GateDecision::Pass;
    }

    if has_token {
        return GateDecision::Pass;
    }

    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair(NEXT_PARAM, path)
        .finish();

    GateDecision::RedirectToLogin {
        location: format!("{LOGIN_PATH}?{query}"),
    }
}

/// Resolve the `next` parameter to a local path, dropping any query.
fn return_target(query: Option<&str>) -> String {
    let next = query.and_then(|q| {
        url::form_urlencoded::parse(q.as_bytes())
            .find(|(k, _)| k == NEXT_PARAM)
            .map(|(_, v)| v.into_owned())
    });

    match next {
        // Only same-origin absolute paths; `//host` would leave the site
        Some(target) if target.starts_with('/') && !target.starts_with("//") => {
            target.split(['?', '#']).next().unwrap_or(DEFAULT_LANDING).to_string()
        }
        _ => DEFAULT_LANDING.to_string(),
    }
}

/// Gate middleware
pub async fn gate_middleware(req: Request, next: Next) -> Response {
    let has_token = token_from_headers(req.headers()).is_some();
    let uri = req.uri();

    match decide(uri.path(), uri.query(), has_token) {
        GateDecision::Pass => next.run(req).await,
        GateDecision::RedirectToLogin { location } => {
            tracing::debug!(path = %uri.path(), "No session - redirecting to login");
            Redirect::temporary(&location).into_response()
        }
        GateDecision::RedirectTo { location } => {
            tracing::debug!(target = %location, "Session present - leaving login page");
            Redirect::temporary(&location).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protected_paths_redirect_to_login() {
        for path in ["/", "/alerts", "/decisions", "/api/alerts", "/api/decisions/bulk-delete"] {
            let decision = decide(path, None, false);
            let expected = format!(
                "/login?next={}",
                url::form_urlencoded::byte_serialize(path.as_bytes()).collect::<String>()
            );
            assert_eq!(decision, GateDecision::RedirectToLogin { location: expected });
        }
    }

    #[test]
    fn test_redirect_encodes_path() {
        assert_eq!(
            decide("/alerts", Some("limit=20"), false),
            GateDecision::RedirectToLogin {
                location: "/login?next=%2Falerts".to_string()
            }
        );
    }

    #[test]
    fn test_protected_paths_pass_with_token() {
        assert_eq!(decide("/alerts", None, true), GateDecision::Pass);
        assert_eq!(decide("/api/allowlist/1.2.3.4", None, true), GateDecision::Pass);
    }

    #[test]
    fn test_public_prefixes_pass_without_token() {
        for path in [
            "/login",
            "/static/app.css",
            "/favicon.ico",
            "/api/login",
            "/api/logout",
            "/api/session",
            "/api/debug",
            "/api/health",
            "/api/healthz",
        ] {
            assert_eq!(decide(path, None, false), GateDecision::Pass, "{path}");
        }
    }

    #[test]
    fn test_login_with_token_goes_to_landing() {
        assert_eq!(
            decide("/login", None, true),
            GateDecision::RedirectTo {
                location: "/".to_string()
            }
        );
    }

    #[test]
    fn test_login_with_token_follows_next_and_drops_query() {
        assert_eq!(
            decide("/login", Some("next=%2Fdecisions&error=x"), true),
            GateDecision::RedirectTo {
                location: "/decisions".to_string()
            }
        );
        assert_eq!(
            decide("/login", Some("next=%2Falerts%3Flimit%3D50"), true),
            GateDecision::RedirectTo {
                location: "/alerts".to_string()
            }
        );
    }

    #[test]
    fn test_login_next_must_stay_on_site() {
        for query in ["next=https%3A%2F%2Fevil.example", "next=%2F%2Fevil.example", "next="] {
            assert_eq!(
                decide("/login", Some(query), true),
                GateDecision::RedirectTo {
                    location: "/".to_string()
                },
                "{query}"
            );
        }
    }

    #[test]
    fn test_other_public_paths_pass_with_token() {
        assert_eq!(decide("/api/login", None, true), GateDecision::Pass);
        assert_eq!(decide("/login/", None, true), GateDecision::Pass);
    }
}
