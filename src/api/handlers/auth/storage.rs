//! Database-backed session persistence.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::Instrument;

use super::session::{SessionClaims, SessionRecord, SessionStore};
use super::utils::{generate_session_token, hash_session_token, is_unique_violation};

pub struct PgSessionStore {
    pool: PgPool,
    digest_key: Vec<u8>,
}

impl PgSessionStore {
    #[must_use]
    pub fn new(pool: PgPool, digest_key: Vec<u8>) -> Self {
        Self { pool, digest_key }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn insert(&self, claims: &SessionClaims, ttl_seconds: i64) -> Result<String> {
        // Generate a random token, store only its keyed digest, and return the
        // raw value so the caller can set the session cookie.
        let query = r"
            INSERT INTO user_sessions (user_id, email, role, session_hash, expires_at)
            VALUES ($1, $2, $3, $4, NOW() + ($5 * INTERVAL '1 second'))
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );

        for _ in 0..3 {
            let token = generate_session_token()?;
            let token_hash = hash_session_token(&self.digest_key, &token);
            let result = sqlx::query(query)
                .bind(claims.user_id)
                .bind(&claims.email)
                .bind(&claims.role)
                .bind(token_hash)
                .bind(ttl_seconds)
                .execute(&self.pool)
                .instrument(span.clone())
                .await;
            match result {
                Ok(_) => return Ok(token),
                Err(err) if is_unique_violation(&err) => continue,
                Err(err) => return Err(err).context("failed to insert session"),
            }
        }

        Err(anyhow!("failed to insert session after retries"))
    }

    async fn lookup(&self, token: &str) -> Result<Option<SessionRecord>> {
        let query = r"
            SELECT user_id, email, role FROM user_sessions
            WHERE session_hash = $1 AND expires_at > NOW()
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let token_hash = hash_session_token(&self.digest_key, token);
        let row = sqlx::query(query)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup session")?;

        Ok(row.map(|row| SessionRecord {
            user_id: row.get("user_id"),
            email: row.get("email"),
            role: row.get("role"),
        }))
    }

    async fn delete(&self, token: &str) -> Result<()> {
        let query = "DELETE FROM user_sessions WHERE session_hash = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        let token_hash = hash_session_token(&self.digest_key, token);
        sqlx::query(query)
            .bind(token_hash)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to delete session")?;

        Ok(())
    }
}
