//! Credential checks for the login flow.
//!
//! Flow Overview: validate input, consult the rate limiter, look up the user,
//! verify the password hash, and write one audit row per attempt that reached
//! the store.

use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::audit::{AuditLogger, LoginLogEntry, LoginStatus};
use super::error::AuthError;
use super::password::PasswordHasher;
use super::rate_limit::{RateLimitDecision, RateLimiter};
use super::store::{UserRecord, UserStore};
use super::utils::normalize_email;

/// Minimal authenticated identity handed to the session layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
}

impl From<&UserRecord> for Identity {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role.clone(),
        }
    }
}

/// Behavior toggles for the authorize step.
#[derive(Clone, Copy, Debug)]
pub struct AuthorizerOptions {
    /// Report unknown email and wrong password as one generic message.
    pub generic_error_messages: bool,
    /// Reject accounts with `is_active = false`.
    pub enforce_active_flag: bool,
}

impl Default for AuthorizerOptions {
    fn default() -> Self {
        Self {
            generic_error_messages: true,
            enforce_active_flag: true,
        }
    }
}

/// Request metadata recorded in the audit trail.
#[derive(Clone, Debug, Default)]
pub struct RequestMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

pub struct CredentialAuthorizer {
    store: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
    rate_limiter: Option<Arc<dyn RateLimiter>>,
    audit: Option<Arc<dyn AuditLogger>>,
    options: AuthorizerOptions,
}

impl CredentialAuthorizer {
    #[must_use]
    pub fn new(
        store: Arc<dyn UserStore>,
        hasher: Arc<dyn PasswordHasher>,
        options: AuthorizerOptions,
    ) -> Self {
        Self {
            store,
            hasher,
            rate_limiter: None,
            audit: None,
            options,
        }
    }

    #[must_use]
    pub fn with_rate_limiter(mut self, rate_limiter: Arc<dyn RateLimiter>) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }

    #[must_use]
    pub fn with_audit_logger(mut self, audit: Arc<dyn AuditLogger>) -> Self {
        self.audit = Some(audit);
        self
    }

    #[must_use]
    pub fn options(&self) -> AuthorizerOptions {
        self.options
    }

    /// Authorize an email/password pair.
    ///
    /// # Errors
    ///
    /// `MissingCredentials` when either field is absent, `RateLimited` before
    /// any store lookup once the per-email window is exhausted,
    /// `UserNotFound`, `InactiveUser`, `InvalidPassword` per the lookup and
    /// hash check, and `Store` for infrastructure failures.
    pub async fn authorize(
        &self,
        email: &str,
        password: &str,
        meta: &RequestMeta,
    ) -> Result<Identity, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let email = normalize_email(email);

        if let Some(limiter) = &self.rate_limiter {
            if limiter.check_and_increment(&email).await == RateLimitDecision::Limited {
                debug!("login throttled");
                return Err(AuthError::RateLimited);
            }
        }

        match self.check_credentials(&email, password).await {
            Ok(user) => {
                let identity = Identity::from(&user);
                self.record(LoginStatus::Success, Some(user.id), &email, meta, None)
                    .await;
                Ok(identity)
            }
            Err(err) => {
                debug!("login rejected: {err}");
                self.record(LoginStatus::Failed, None, &email, meta, Some(&err))
                    .await;
                Err(err)
            }
        }
    }

    async fn check_credentials(&self, email: &str, password: &str) -> Result<UserRecord, AuthError> {
        let Some(user) = self
            .store
            .find_by_email(email)
            .await
            .map_err(AuthError::Store)?
        else {
            return Err(AuthError::UserNotFound);
        };

        if self.options.enforce_active_flag && !user.is_active {
            return Err(AuthError::InactiveUser);
        }

        let verified = self
            .hasher
            .verify(password, &user.password_hash)
            .map_err(AuthError::Store)?;
        if !verified {
            return Err(AuthError::InvalidPassword);
        }

        Ok(user)
    }

    async fn record(
        &self,
        status: LoginStatus,
        user_id: Option<Uuid>,
        email: &str,
        meta: &RequestMeta,
        error: Option<&AuthError>,
    ) {
        let Some(audit) = &self.audit else {
            return;
        };
        audit
            .record(LoginLogEntry {
                user_id,
                email: email.to_string(),
                status,
                ip_address: meta.ip_address.clone(),
                user_agent: meta.user_agent.clone(),
                error_message: error.map(AuthError::audit_message),
            })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::password::Argon2PasswordHasher;
    use crate::api::handlers::auth::rate_limit::{RateLimitSettings, SlidingWindowRateLimiter};
    use crate::api::handlers::auth::test_support::{user_record, MemoryUserStore, RecordingAuditLogger};
    use anyhow::Result;
    use std::time::Duration;

    fn authorizer(
        store: Arc<MemoryUserStore>,
        options: AuthorizerOptions,
    ) -> (CredentialAuthorizer, Arc<RecordingAuditLogger>) {
        let audit = Arc::new(RecordingAuditLogger::default());
        let authorizer = CredentialAuthorizer::new(store, Arc::new(Argon2PasswordHasher), options)
            .with_audit_logger(audit.clone());
        (authorizer, audit)
    }

    #[tokio::test]
    async fn missing_fields_fail_without_a_lookup() -> Result<()> {
        let store = Arc::new(MemoryUserStore::default());
        let (authorizer, audit) = authorizer(store.clone(), AuthorizerOptions::default());

        for (email, password) in [("", "hunter2"), ("alice@example.com", ""), ("", ""), ("   ", "x")]
        {
            let err = authorizer
                .authorize(email, password, &RequestMeta::default())
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::MissingCredentials));
        }

        assert_eq!(store.lookup_count(), 0);
        assert!(audit.entries().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn unknown_email_fails_and_audits_once() -> Result<()> {
        let store = Arc::new(MemoryUserStore::default());
        let (authorizer, audit) = authorizer(store, AuthorizerOptions::default());

        let err = authorizer
            .authorize("ghost@example.com", "hunter2", &RequestMeta::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));

        let entries = audit.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, LoginStatus::Failed);
        assert_eq!(entries[0].email, "ghost@example.com");
        assert_eq!(entries[0].user_id, None);
        Ok(())
    }

    #[tokio::test]
    async fn wrong_password_fails_and_audits_the_precise_reason() -> Result<()> {
        let store = Arc::new(MemoryUserStore::default());
        store.insert(user_record("alice@example.com", "right", "USER", true)?);
        let (authorizer, audit) = authorizer(store, AuthorizerOptions::default());

        let err = authorizer
            .authorize("alice@example.com", "wrong", &RequestMeta::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidPassword));
        // merged for callers, precise in the trail
        assert_eq!(err.public_message(true), "Email or password is incorrect");

        let entries = audit.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].error_message.as_deref(),
            Some("Wrong password")
        );
        Ok(())
    }

    #[tokio::test]
    async fn correct_password_returns_the_user_subset() -> Result<()> {
        let store = Arc::new(MemoryUserStore::default());
        let record = user_record("alice@example.com", "hunter2", "ADMIN", true)?;
        let expected_id = record.id;
        store.insert(record);
        let (authorizer, audit) = authorizer(store, AuthorizerOptions::default());

        let meta = RequestMeta {
            ip_address: Some("203.0.113.7".to_string()),
            user_agent: Some("curl/8.0".to_string()),
        };
        let identity = authorizer
            .authorize("alice@example.com", "hunter2", &meta)
            .await?;

        assert_eq!(identity.id, expected_id);
        assert_eq!(identity.email, "alice@example.com");
        assert_eq!(identity.role, "ADMIN");

        let entries = audit.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, LoginStatus::Success);
        assert_eq!(entries[0].user_id, Some(expected_id));
        assert_eq!(entries[0].ip_address.as_deref(), Some("203.0.113.7"));
        assert_eq!(entries[0].error_message, None);
        Ok(())
    }

    #[tokio::test]
    async fn inactive_accounts_are_rejected_unless_allowed() -> Result<()> {
        let store = Arc::new(MemoryUserStore::default());
        store.insert(user_record("bob@example.com", "hunter2", "USER", false)?);

        let (strict, _) = authorizer(store.clone(), AuthorizerOptions::default());
        let err = strict
            .authorize("bob@example.com", "hunter2", &RequestMeta::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InactiveUser));

        let (lenient, _) = authorizer(
            store,
            AuthorizerOptions {
                enforce_active_flag: false,
                ..AuthorizerOptions::default()
            },
        );
        let identity = lenient
            .authorize("bob@example.com", "hunter2", &RequestMeta::default())
            .await?;
        assert_eq!(identity.email, "bob@example.com");
        Ok(())
    }

    #[tokio::test]
    async fn email_is_normalized_before_lookup() -> Result<()> {
        let store = Arc::new(MemoryUserStore::default());
        store.insert(user_record("alice@example.com", "hunter2", "USER", true)?);
        let (authorizer, _) = authorizer(store, AuthorizerOptions::default());

        let identity = authorizer
            .authorize(" Alice@Example.COM ", "hunter2", &RequestMeta::default())
            .await?;
        assert_eq!(identity.email, "alice@example.com");
        Ok(())
    }

    #[tokio::test]
    async fn rate_limit_fires_before_any_lookup() -> Result<()> {
        let store = Arc::new(MemoryUserStore::default());
        store.insert(user_record("alice@example.com", "hunter2", "USER", true)?);
        let audit = Arc::new(RecordingAuditLogger::default());
        let authorizer = CredentialAuthorizer::new(
            store.clone(),
            Arc::new(Argon2PasswordHasher),
            AuthorizerOptions::default(),
        )
        .with_audit_logger(audit.clone())
        .with_rate_limiter(Arc::new(SlidingWindowRateLimiter::new(RateLimitSettings {
            max_attempts: 2,
            window: Duration::from_secs(60),
        })));

        for _ in 0..2 {
            let _ = authorizer
                .authorize("alice@example.com", "wrong", &RequestMeta::default())
                .await;
        }
        let lookups_before = store.lookup_count();

        let err = authorizer
            .authorize("alice@example.com", "hunter2", &RequestMeta::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::RateLimited));
        assert_eq!(store.lookup_count(), lookups_before);
        // throttled attempts never reach the audit trail
        assert_eq!(audit.entries().await.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn audit_entries_never_carry_the_stored_hash() -> Result<()> {
        let store = Arc::new(MemoryUserStore::default());
        store.insert(user_record("alice@example.com", "hunter2", "USER", true)?);
        let (authorizer, audit) = authorizer(store, AuthorizerOptions::default());

        let _ = authorizer
            .authorize("alice@example.com", "wrong", &RequestMeta::default())
            .await;
        let _ = authorizer
            .authorize("alice@example.com", "hunter2", &RequestMeta::default())
            .await;

        for entry in audit.entries().await {
            let rendered = format!("{entry:?}");
            assert!(!rendered.contains("argon2"));
            assert!(!rendered.contains("hunter2"));
        }
        Ok(())
    }
}
