//! Auth code and session repository
//!
//! Backing store for the session abstraction: create, verify, invalidate,
//! sweep. Rows hold keyed hashes, never plaintext credentials.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::{ApiSession, AuthCode};
use crate::utils::errors::KosError;

const CODE_COLUMNS: &str =
    "id, code_mac, actor_id, actor_name, is_used, used_at, expires_at, created_at";
const SESSION_COLUMNS: &str =
    "id, token_mac, actor_id, actor_name, kind, expires_at, last_used_at, created_at";

#[derive(Debug, Clone)]
pub struct AuthRepository {
    pool: PgPool,
}

impl AuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert_code(
        &self,
        code_mac: &str,
        actor_id: &str,
        actor_name: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<AuthCode, KosError> {
        let code = sqlx::query_as::<_, AuthCode>(&format!(
            r#"
            INSERT INTO auth_codes (code_mac, actor_id, actor_name, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING {CODE_COLUMNS}
            "#
        ))
        .bind(code_mac)
        .bind(actor_id)
        .bind(actor_name)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(code)
    }

    /// Atomically consume an unused, unexpired code. Returns `None` when
    /// the code is unknown, already used, or expired.
    pub async fn consume_code(
        &self,
        code_mac: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AuthCode>, KosError> {
        let code = sqlx::query_as::<_, AuthCode>(&format!(
            r#"
            UPDATE auth_codes
            SET is_used = TRUE, used_at = $2
            WHERE code_mac = $1 AND is_used = FALSE AND expires_at > $2
            RETURNING {CODE_COLUMNS}
            "#
        ))
        .bind(code_mac)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(code)
    }

    pub async fn insert_session(
        &self,
        token_mac: &str,
        actor_id: &str,
        actor_name: &str,
        kind: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<ApiSession, KosError> {
        let session = sqlx::query_as::<_, ApiSession>(&format!(
            r#"
            INSERT INTO api_sessions (token_mac, actor_id, actor_name, kind, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(token_mac)
        .bind(actor_id)
        .bind(actor_name)
        .bind(kind)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(session)
    }

    pub async fn find_session(
        &self,
        token_mac: &str,
        kind: &str,
    ) -> Result<Option<ApiSession>, KosError> {
        let session = sqlx::query_as::<_, ApiSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM api_sessions WHERE token_mac = $1 AND kind = $2"
        ))
        .bind(token_mac)
        .bind(kind)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Whether an actor holds any unexpired session of the given kind.
    pub async fn has_active_session(
        &self,
        actor_id: &str,
        kind: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, KosError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM api_sessions WHERE actor_id = $1 AND kind = $2 AND expires_at > $3",
        )
        .bind(actor_id)
        .bind(kind)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0 > 0)
    }

    /// Stamp last-used; best-effort at the call site.
    pub async fn touch_session(&self, id: i64, now: DateTime<Utc>) -> Result<(), KosError> {
        sqlx::query("UPDATE api_sessions SET last_used_at = $2 WHERE id = $1")
            .bind(id)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete every session an actor holds of the given kind.
    pub async fn delete_sessions_for_actor(
        &self,
        actor_id: &str,
        kind: &str,
    ) -> Result<u64, KosError> {
        let result = sqlx::query("DELETE FROM api_sessions WHERE actor_id = $1 AND kind = $2")
            .bind(actor_id)
            .bind(kind)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Delete a session. Returns whether a row existed.
    pub async fn delete_session(&self, token_mac: &str) -> Result<bool, KosError> {
        let result = sqlx::query("DELETE FROM api_sessions WHERE token_mac = $1")
            .bind(token_mac)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Drop expired codes and sessions. Returns (codes, sessions) deleted.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<(u64, u64), KosError> {
        let codes = sqlx::query("DELETE FROM auth_codes WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();

        let sessions = sqlx::query("DELETE FROM api_sessions WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok((codes, sessions))
    }
}
