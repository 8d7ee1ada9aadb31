//! KOS entry repository implementation
//!
//! Reads run against the pool; the write methods take an explicit
//! connection so the service layer can group an entry mutation with its
//! history record in one transaction.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::models::{Actor, CreateEntryRequest, KosEntry, ListFilter};
use crate::utils::errors::KosError;

const ENTRY_COLUMNS: &str = "id, roblox_user_id, roblox_username, reason, added_by_id, added_by_name, \
     expires_at, is_permanent, status, thumbnail_url, removed_by_id, removed_by_name, removed_at, \
     created_at, updated_at";

#[derive(Debug, Clone)]
pub struct EntryRepository {
    pool: PgPool,
}

impl EntryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the active entry for a Roblox user, if any.
    pub async fn find_active(&self, roblox_user_id: &str) -> Result<Option<KosEntry>, KosError> {
        let entry = sqlx::query_as::<_, KosEntry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM kos_entries WHERE roblox_user_id = $1 AND status = 'active'"
        ))
        .bind(roblox_user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Find a Roblox user's active entry within a transaction.
    pub async fn find_active_tx(
        &self,
        conn: &mut PgConnection,
        roblox_user_id: &str,
    ) -> Result<Option<KosEntry>, KosError> {
        let entry = sqlx::query_as::<_, KosEntry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM kos_entries WHERE roblox_user_id = $1 AND status = 'active'"
        ))
        .bind(roblox_user_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(entry)
    }

    /// Most recent entry row for a Roblox user regardless of status.
    pub async fn find_latest_tx(
        &self,
        conn: &mut PgConnection,
        roblox_user_id: &str,
    ) -> Result<Option<KosEntry>, KosError> {
        let entry = sqlx::query_as::<_, KosEntry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM kos_entries WHERE roblox_user_id = $1 ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(roblox_user_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(entry)
    }

    /// Find the active entry by stored username, case-insensitively.
    pub async fn find_active_by_name(&self, username: &str) -> Result<Option<KosEntry>, KosError> {
        let entry = sqlx::query_as::<_, KosEntry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM kos_entries \
             WHERE LOWER(roblox_username) = LOWER($1) AND status = 'active'"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Insert a fresh active entry.
    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        request: &CreateEntryRequest,
    ) -> Result<KosEntry, KosError> {
        let entry = sqlx::query_as::<_, KosEntry>(&format!(
            r#"
            INSERT INTO kos_entries
                (roblox_user_id, roblox_username, reason, added_by_id, added_by_name,
                 expires_at, is_permanent, status, thumbnail_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'active', $8)
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(&request.roblox_user_id)
        .bind(&request.roblox_username)
        .bind(&request.reason)
        .bind(&request.added_by.id)
        .bind(&request.added_by.name)
        .bind(request.expires_at)
        .bind(request.is_permanent)
        .bind(&request.thumbnail_url)
        .fetch_one(&mut *conn)
        .await?;

        Ok(entry)
    }

    /// Reactivate an archived row for a re-added user, stamping the new
    /// reason, actor and expiry and clearing the archival metadata.
    pub async fn reactivate(
        &self,
        conn: &mut PgConnection,
        id: i64,
        request: &CreateEntryRequest,
    ) -> Result<KosEntry, KosError> {
        let entry = sqlx::query_as::<_, KosEntry>(&format!(
            r#"
            UPDATE kos_entries
            SET status = 'active',
                roblox_username = $2,
                reason = $3,
                added_by_id = $4,
                added_by_name = $5,
                expires_at = $6,
                is_permanent = $7,
                thumbnail_url = $8,
                removed_by_id = NULL,
                removed_by_name = NULL,
                removed_at = NULL,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&request.roblox_username)
        .bind(&request.reason)
        .bind(&request.added_by.id)
        .bind(&request.added_by.name)
        .bind(request.expires_at)
        .bind(request.is_permanent)
        .bind(&request.thumbnail_url)
        .fetch_one(&mut *conn)
        .await?;

        Ok(entry)
    }

    /// Flip an entry to archived, stamping the archival metadata.
    pub async fn archive(
        &self,
        conn: &mut PgConnection,
        id: i64,
        removed_by: &Actor,
        removed_at: DateTime<Utc>,
    ) -> Result<KosEntry, KosError> {
        let entry = sqlx::query_as::<_, KosEntry>(&format!(
            r#"
            UPDATE kos_entries
            SET status = 'archived',
                removed_by_id = $2,
                removed_by_name = $3,
                removed_at = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&removed_by.id)
        .bind(&removed_by.name)
        .bind(removed_at)
        .fetch_one(&mut *conn)
        .await?;

        Ok(entry)
    }

    /// Active, non-permanent entries whose expiry has passed.
    pub async fn expired_candidates(
        &self,
        conn: &mut PgConnection,
        now: DateTime<Utc>,
    ) -> Result<Vec<KosEntry>, KosError> {
        let entries = sqlx::query_as::<_, KosEntry>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS} FROM kos_entries
            WHERE status = 'active'
              AND is_permanent = FALSE
              AND expires_at IS NOT NULL
              AND expires_at < $1
            ORDER BY expires_at ASC
            "#
        ))
        .bind(now)
        .fetch_all(&mut *conn)
        .await?;

        Ok(entries)
    }

    /// Filtered listing, newest first.
    pub async fn list(
        &self,
        filter: ListFilter,
        window_end: DateTime<Utc>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<KosEntry>, KosError> {
        let entries = match filter {
            ListFilter::Expiring => {
                sqlx::query_as::<_, KosEntry>(&format!(
                    "SELECT {ENTRY_COLUMNS} FROM kos_entries WHERE {EXPIRING_CLAUSE} \
                     ORDER BY created_at DESC LIMIT $2 OFFSET $3"
                ))
                .bind(window_end)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            other => {
                sqlx::query_as::<_, KosEntry>(&format!(
                    "SELECT {ENTRY_COLUMNS} FROM kos_entries WHERE {} \
                     ORDER BY created_at DESC LIMIT $1 OFFSET $2",
                    Self::status_clause(other)
                ))
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(entries)
    }

    /// Count of entries matching a filter.
    pub async fn count(
        &self,
        filter: ListFilter,
        window_end: DateTime<Utc>,
    ) -> Result<i64, KosError> {
        let count: (i64,) = match filter {
            ListFilter::Expiring => {
                sqlx::query_as(&format!(
                    "SELECT COUNT(*) FROM kos_entries WHERE {EXPIRING_CLAUSE}"
                ))
                .bind(window_end)
                .fetch_one(&self.pool)
                .await?
            }
            other => {
                sqlx::query_as(&format!(
                    "SELECT COUNT(*) FROM kos_entries WHERE {}",
                    Self::status_clause(other)
                ))
                .fetch_one(&self.pool)
                .await?
            }
        };

        Ok(count.0)
    }

    fn status_clause(filter: ListFilter) -> &'static str {
        match filter {
            ListFilter::Active => "status = 'active'",
            ListFilter::Permanent => "status = 'active' AND is_permanent = TRUE",
            ListFilter::Archived => "status = 'archived'",
            // Expiring binds the window end and is handled by the caller.
            ListFilter::Expiring => EXPIRING_CLAUSE,
        }
    }
}

/// Active, non-permanent entries inside the expiring window ($1 = window end).
const EXPIRING_CLAUSE: &str = "status = 'active' AND is_permanent = FALSE \
     AND expires_at IS NOT NULL AND expires_at > NOW() AND expires_at <= $1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_archived_filter_leaves_active_scope() {
        assert!(EntryRepository::status_clause(ListFilter::Archived).contains("'archived'"));
        for filter in [ListFilter::Active, ListFilter::Expiring, ListFilter::Permanent] {
            assert!(EntryRepository::status_clause(filter).contains("'active'"));
        }
    }

    #[test]
    fn expiring_clause_excludes_permanent_entries() {
        assert!(EXPIRING_CLAUSE.contains("is_permanent = FALSE"));
        assert!(EXPIRING_CLAUSE.contains("expires_at IS NOT NULL"));
    }

    #[tokio::test]
    async fn repository_creation() {
        // Requires a running database; skipped when none is reachable.
        let pool = PgPool::connect("postgresql://localhost/brotherhood_kos_test").await;
        if let Ok(pool) = pool {
            let repo = EntryRepository::new(pool);
            assert!(!repo.pool.is_closed());
        }
    }
}
