//! Session issuance, materialization, and the redirect policy.
//!
//! The session record carries the `id` and `role` copied from the authorized
//! identity at issuance; the session endpoint copies them back out on each
//! request. Raw tokens only ever travel in the cookie (or a bearer header);
//! the store sees a keyed digest.

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    extract::Extension,
    http::{
        header::{InvalidHeaderValue, AUTHORIZATION, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::error;
use url::Url;
use uuid::Uuid;

use super::authorizer::Identity;
use super::state::{AuthConfig, AuthState};
use super::types::{LogoutResponse, SessionResponse};

const SESSION_COOKIE_NAME: &str = "ensaluto_session";
const DEFAULT_LANDING_PATH: &str = "/dashboard";

/// Fields copied from a freshly authorized identity into the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionClaims {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
}

impl SessionClaims {
    #[must_use]
    pub fn from_identity(identity: &Identity) -> Self {
        Self {
            user_id: identity.id,
            email: identity.email.clone(),
            role: identity.role.clone(),
        }
    }
}

/// Claims materialized back out of the store for a presented token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionRecord {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist claims with a TTL and return the raw token for the cookie.
    async fn insert(&self, claims: &SessionClaims, ttl_seconds: i64) -> Result<String>;

    /// Resolve a presented token. `Ok(None)` for unknown or expired tokens.
    async fn lookup(&self, token: &str) -> Result<Option<SessionRecord>>;

    async fn delete(&self, token: &str) -> Result<()>;
}

/// Resolve the post-login destination against the site base URL.
///
/// Relative paths are prefixed with the base URL, absolute URLs on the same
/// origin pass through unchanged, and anything else falls back to the default
/// landing path. Scheme-relative targets count as foreign.
#[must_use]
pub fn resolve_redirect(target: Option<&str>, base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let fallback = format!("{base}{DEFAULT_LANDING_PATH}");

    let Some(target) = target.map(str::trim).filter(|value| !value.is_empty()) else {
        return fallback;
    };

    if target.starts_with("//") {
        return fallback;
    }
    if target.starts_with('/') {
        return format!("{base}{target}");
    }

    match (Url::parse(target), Url::parse(base_url)) {
        (Ok(url), Ok(base_parsed)) if url.origin() == base_parsed.origin() => target.to_string(),
        _ => fallback,
    }
}

/// Absolute URL of a configured page path.
pub(super) fn page_url(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

/// Build a secure `HttpOnly` cookie for the session token.
pub(super) fn session_cookie(
    config: &AuthConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = config.session_ttl_seconds();
    let secure = config.session_cookie_secure();
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn clear_session_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let secure = config.session_cookie_secure();
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(super) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    let header = headers.get(axum::http::header::COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == SESSION_COOKIE_NAME {
            return Some(val.to_string());
        }
    }
    None
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[utoipa::path(
    get,
    path = "/v1/auth/session",
    responses(
        (status = 200, description = "Session is active", body = SessionResponse),
        (status = 204, description = "No active session")
    ),
    tag = "auth"
)]
pub async fn session(headers: HeaderMap, auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    // Missing cookies are treated as "no session" to avoid leaking auth state.
    let Some(token) = extract_session_token(&headers) else {
        return StatusCode::NO_CONTENT.into_response();
    };
    match auth_state.sessions().lookup(&token).await {
        Ok(Some(record)) => {
            let response = SessionResponse {
                id: record.user_id.to_string(),
                email: record.email,
                role: record.role,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            error!("Failed to lookup session: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 200, description = "Session cleared", body = LogoutResponse)
    ),
    tag = "auth"
)]
pub async fn logout(headers: HeaderMap, auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    if let Some(token) = extract_session_token(&headers) {
        if let Err(err) = auth_state.sessions().delete(&token).await {
            error!("Failed to delete session: {err}");
        }
    }

    // Always clear the cookie, even if the session record was missing.
    let mut response_headers = HeaderMap::new();
    if let Ok(cookie) = clear_session_cookie(auth_state.config()) {
        response_headers.insert(SET_COOKIE, cookie);
    }

    let config = auth_state.config();
    let redirect = page_url(config.base_url(), &config.pages().sign_out);
    (StatusCode::OK, response_headers, Json(LogoutResponse { redirect })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_target_is_joined_to_the_base() {
        assert_eq!(
            resolve_redirect(Some("/dashboard"), "https://app.example"),
            "https://app.example/dashboard"
        );
        assert_eq!(
            resolve_redirect(Some("/settings/profile"), "https://app.example/"),
            "https://app.example/settings/profile"
        );
    }

    #[test]
    fn same_origin_absolute_target_passes_through() {
        assert_eq!(
            resolve_redirect(Some("https://app.example/x"), "https://app.example"),
            "https://app.example/x"
        );
    }

    #[test]
    fn foreign_target_falls_back_to_the_landing_page() {
        assert_eq!(
            resolve_redirect(Some("https://evil.example/x"), "https://app.example"),
            "https://app.example/dashboard"
        );
    }

    #[test]
    fn scheme_relative_target_counts_as_foreign() {
        assert_eq!(
            resolve_redirect(Some("//evil.example/x"), "https://app.example"),
            "https://app.example/dashboard"
        );
    }

    #[test]
    fn missing_target_lands_on_the_default_page() {
        assert_eq!(
            resolve_redirect(None, "https://app.example"),
            "https://app.example/dashboard"
        );
        assert_eq!(
            resolve_redirect(Some("  "), "https://app.example"),
            "https://app.example/dashboard"
        );
    }

    #[test]
    fn different_port_is_a_different_origin() {
        assert_eq!(
            resolve_redirect(Some("https://app.example:8443/x"), "https://app.example"),
            "https://app.example/dashboard"
        );
    }

    #[test]
    fn claims_copy_id_and_role_from_the_identity() {
        let identity = Identity {
            id: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            name: "Alice".to_string(),
            role: "ADMIN".to_string(),
        };
        let claims = SessionClaims::from_identity(&identity);
        assert_eq!(claims.user_id, identity.id);
        assert_eq!(claims.role, "ADMIN");
        assert_eq!(claims.email, "alice@example.com");
    }

    #[test]
    fn session_cookie_sets_the_expected_attributes() {
        let config = AuthConfig::new("https://app.example".to_string());
        let cookie = session_cookie(&config, "tok3n").unwrap();
        let value = cookie.to_str().unwrap();
        assert!(value.starts_with("ensaluto_session=tok3n;"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("SameSite=Lax"));
        assert!(value.contains("Max-Age=2592000"));
        assert!(value.contains("Secure"));
    }

    #[test]
    fn insecure_base_url_omits_the_secure_attribute() {
        let config = AuthConfig::new("http://localhost:3000".to_string());
        let cookie = session_cookie(&config, "tok3n").unwrap();
        assert!(!cookie.to_str().unwrap().contains("Secure"));
    }

    #[test]
    fn extract_token_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("theme=dark; ensaluto_session=tok3n; lang=eo"),
        );
        assert_eq!(extract_session_token(&headers), Some("tok3n".to_string()));
    }

    #[test]
    fn extract_token_prefers_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer be4rer"));
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("ensaluto_session=tok3n"),
        );
        assert_eq!(extract_session_token(&headers), Some("be4rer".to_string()));
    }

    #[test]
    fn extract_token_none_without_either_header() {
        assert_eq!(extract_session_token(&HeaderMap::new()), None);
    }
}
