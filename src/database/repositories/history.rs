//! KOS history repository implementation
//!
//! Append-only: inserts and reads, no updates or deletes.

use sqlx::{PgConnection, PgPool};

use crate::models::{CreateHistoryRequest, HistoryRecord};
use crate::utils::errors::KosError;

const HISTORY_COLUMNS: &str = "id, entry_id, roblox_user_id, roblox_username, action, reason, \
     performed_by_id, performed_by_name, created_at";

#[derive(Debug, Clone)]
pub struct HistoryRepository {
    pool: PgPool,
}

impl HistoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append a history record within the caller's transaction.
    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        request: &CreateHistoryRequest,
    ) -> Result<HistoryRecord, KosError> {
        let record = sqlx::query_as::<_, HistoryRecord>(&format!(
            r#"
            INSERT INTO kos_history
                (entry_id, roblox_user_id, roblox_username, action, reason,
                 performed_by_id, performed_by_name)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {HISTORY_COLUMNS}
            "#
        ))
        .bind(request.entry_id)
        .bind(&request.roblox_user_id)
        .bind(&request.roblox_username)
        .bind(request.action.as_str())
        .bind(&request.reason)
        .bind(&request.performed_by.id)
        .bind(&request.performed_by.name)
        .fetch_one(&mut *conn)
        .await?;

        Ok(record)
    }

    /// Paged audit trail, newest first.
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<HistoryRecord>, KosError> {
        let records = sqlx::query_as::<_, HistoryRecord>(&format!(
            "SELECT {HISTORY_COLUMNS} FROM kos_history ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    pub async fn count(&self) -> Result<i64, KosError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM kos_history")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    /// Recent records for one entry, newest first.
    pub async fn for_entry(&self, entry_id: i64, limit: i64) -> Result<Vec<HistoryRecord>, KosError> {
        let records = sqlx::query_as::<_, HistoryRecord>(&format!(
            "SELECT {HISTORY_COLUMNS} FROM kos_history WHERE entry_id = $1 ORDER BY created_at DESC LIMIT $2"
        ))
        .bind(entry_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
