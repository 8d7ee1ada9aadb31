//! Operational log repository implementation

use sqlx::PgPool;

use crate::models::LogRecord;
use crate::utils::errors::KosError;

#[derive(Debug, Clone)]
pub struct LogRepository {
    pool: PgPool,
}

impl LogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn append(
        &self,
        level: &str,
        category: &str,
        message: &str,
        actor: Option<&str>,
    ) -> Result<(), KosError> {
        sqlx::query(
            "INSERT INTO kos_logs (level, category, message, actor) VALUES ($1, $2, $3, $4)",
        )
        .bind(level)
        .bind(category)
        .bind(message)
        .bind(actor)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Recent log lines, optionally scoped to one category.
    pub async fn recent(
        &self,
        limit: i64,
        category: Option<&str>,
    ) -> Result<Vec<LogRecord>, KosError> {
        let records = match category {
            Some(category) => {
                sqlx::query_as::<_, LogRecord>(
                    "SELECT id, level, category, message, actor, created_at FROM kos_logs \
                     WHERE category = $1 ORDER BY created_at DESC LIMIT $2",
                )
                .bind(category)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, LogRecord>(
                    "SELECT id, level, category, message, actor, created_at FROM kos_logs \
                     ORDER BY created_at DESC LIMIT $1",
                )
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(records)
    }
}
