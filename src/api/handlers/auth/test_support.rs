//! In-memory collaborators for auth tests.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::audit::{AuditLogger, LoginLogEntry};
use super::password::{Argon2PasswordHasher, PasswordHasher};
use super::session::{SessionClaims, SessionRecord, SessionStore};
use super::store::{UserRecord, UserStore};
use super::utils::generate_session_token;

/// Build a user row with a real Argon2 hash for `password`.
pub(crate) fn user_record(email: &str, password: &str, role: &str, active: bool) -> Result<UserRecord> {
    let name = email
        .split('@')
        .next()
        .unwrap_or(email)
        .to_string();
    Ok(UserRecord {
        id: Uuid::new_v4(),
        email: email.to_string(),
        name,
        password_hash: Argon2PasswordHasher.hash(password)?,
        role: role.to_string(),
        is_active: active,
    })
}

#[derive(Default)]
pub(crate) struct MemoryUserStore {
    users: std::sync::Mutex<HashMap<String, UserRecord>>,
    lookups: AtomicUsize,
}

impl MemoryUserStore {
    pub(crate) fn insert(&self, record: UserRecord) {
        self.users
            .lock()
            .unwrap()
            .insert(record.email.clone(), record);
    }

    pub(crate) fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.users.lock().unwrap().get(email).cloned())
    }
}

#[derive(Default)]
pub(crate) struct RecordingAuditLogger {
    entries: Mutex<Vec<LoginLogEntry>>,
}

impl RecordingAuditLogger {
    pub(crate) async fn entries(&self) -> Vec<LoginLogEntry> {
        self.entries.lock().await.clone()
    }
}

#[async_trait]
impl AuditLogger for RecordingAuditLogger {
    async fn record(&self, entry: LoginLogEntry) {
        self.entries.lock().await.push(entry);
    }
}

#[derive(Default)]
pub(crate) struct MemorySessionStore {
    sessions: Mutex<HashMap<String, SessionRecord>>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, claims: &SessionClaims, _ttl_seconds: i64) -> Result<String> {
        let token = generate_session_token()?;
        self.sessions.lock().await.insert(
            token.clone(),
            SessionRecord {
                user_id: claims.user_id,
                email: claims.email.clone(),
                role: claims.role.clone(),
            },
        );
        Ok(token)
    }

    async fn lookup(&self, token: &str) -> Result<Option<SessionRecord>> {
        Ok(self.sessions.lock().await.get(token).cloned())
    }

    async fn delete(&self, token: &str) -> Result<()> {
        self.sessions.lock().await.remove(token);
        Ok(())
    }
}
