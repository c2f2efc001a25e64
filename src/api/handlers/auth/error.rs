//! Error taxonomy for the login flow.

use axum::http::StatusCode;
use thiserror::Error;

/// Why an authorize attempt was rejected.
///
/// Every variant is scoped to a single login attempt; none are retried.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email and password are required")]
    MissingCredentials,
    #[error("Too many login attempts, try again later")]
    RateLimited,
    #[error("No account matches that email")]
    UserNotFound,
    #[error("Wrong password")]
    InvalidPassword,
    #[error("Account is disabled")]
    InactiveUser,
    #[error("Login is temporarily unavailable")]
    Store(anyhow::Error),
}

impl AuthError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingCredentials => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::UserNotFound | Self::InvalidPassword | Self::InactiveUser => {
                StatusCode::UNAUTHORIZED
            }
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the caller.
    ///
    /// With `generic_errors` on, unknown email and wrong password collapse
    /// into one message so responses never reveal which field was wrong.
    #[must_use]
    pub fn public_message(&self, generic_errors: bool) -> String {
        match self {
            Self::UserNotFound | Self::InvalidPassword if generic_errors => {
                "Email or password is incorrect".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Precise internal reason, recorded in the audit trail regardless of the
    /// generic-message toggle.
    #[must_use]
    pub(crate) fn audit_message(&self) -> String {
        match self {
            Self::Store(err) => format!("store error: {err}"),
            other => other.to_string(),
        }
    }
}
