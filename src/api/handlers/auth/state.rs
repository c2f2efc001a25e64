//! Auth state and configuration.

use std::sync::Arc;

use super::authorizer::CredentialAuthorizer;
use super::session::SessionStore;

// 30 days
const DEFAULT_SESSION_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;
const DEFAULT_PAGE_PATH: &str = "/login";

/// Page paths for the login UI; each defaults to `/login`.
#[derive(Clone, Debug)]
pub struct PagePaths {
    pub sign_in: String,
    pub sign_out: String,
    pub error: String,
}

impl Default for PagePaths {
    fn default() -> Self {
        Self {
            sign_in: DEFAULT_PAGE_PATH.to_string(),
            sign_out: DEFAULT_PAGE_PATH.to_string(),
            error: DEFAULT_PAGE_PATH.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    base_url: String,
    session_ttl_seconds: i64,
    pages: PagePaths,
}

impl AuthConfig {
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            pages: PagePaths::default(),
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_pages(mut self, pages: PagePaths) -> Self {
        self.pages = pages;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn pages(&self) -> &PagePaths {
        &self.pages
    }

    pub(super) fn session_cookie_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

/// Shared state for the auth handlers.
pub struct AuthState {
    config: AuthConfig,
    authorizer: CredentialAuthorizer,
    sessions: Arc<dyn SessionStore>,
}

impl AuthState {
    #[must_use]
    pub fn new(
        config: AuthConfig,
        authorizer: CredentialAuthorizer,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            config,
            authorizer,
            sessions,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn authorizer(&self) -> &CredentialAuthorizer {
        &self.authorizer
    }

    #[must_use]
    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }
}
