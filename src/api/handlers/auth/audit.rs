//! Append-only audit trail of login attempts.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, Instrument};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoginStatus {
    Success,
    Failed,
}

impl LoginStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
        }
    }
}

/// One row per authorize attempt. Insert-only; rows are never updated.
#[derive(Clone, Debug)]
pub struct LoginLogEntry {
    pub user_id: Option<Uuid>,
    pub email: String,
    pub status: LoginStatus,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub error_message: Option<String>,
}

#[async_trait]
pub trait AuditLogger: Send + Sync {
    /// Record one login attempt.
    ///
    /// Implementations must not fail the login path: write errors are logged
    /// and swallowed.
    async fn record(&self, entry: LoginLogEntry);
}

#[derive(Clone, Debug)]
pub struct NoopAuditLogger;

#[async_trait]
impl AuditLogger for NoopAuditLogger {
    async fn record(&self, _entry: LoginLogEntry) {}
}

#[derive(Clone)]
pub struct PgAuditLogger {
    pool: PgPool,
}

impl PgAuditLogger {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLogger for PgAuditLogger {
    async fn record(&self, entry: LoginLogEntry) {
        let query = r"
            INSERT INTO login_logs (user_id, email, status, ip_address, user_agent, error_message)
            VALUES ($1, $2, $3, $4::inet, $5, $6)
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT"
        );
        if let Err(err) = sqlx::query(query)
            .bind(entry.user_id)
            .bind(&entry.email)
            .bind(entry.status.as_str())
            .bind(entry.ip_address.as_deref())
            .bind(entry.user_agent.as_deref())
            .bind(entry.error_message.as_deref())
            .execute(&self.pool)
            .instrument(span)
            .await
        {
            error!("Failed to record login attempt: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_text_matches_the_log_table() {
        assert_eq!(LoginStatus::Success.as_str(), "SUCCESS");
        assert_eq!(LoginStatus::Failed.as_str(), "FAILED");
    }
}
