//! Database service layer
//!
//! Bundles the per-table repositories behind one handle and exposes the
//! pool for service-level transactions.

use crate::database::{
    AuthRepository, ConfigRepository, DatabasePool, EntryRepository, HistoryRepository,
    LogRepository,
};

#[derive(Debug, Clone)]
pub struct Database {
    pub entries: EntryRepository,
    pub history: HistoryRepository,
    pub logs: LogRepository,
    pub config: ConfigRepository,
    pub auth: AuthRepository,
    pool: DatabasePool,
}

impl Database {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            entries: EntryRepository::new(pool.clone()),
            history: HistoryRepository::new(pool.clone()),
            logs: LogRepository::new(pool.clone()),
            config: ConfigRepository::new(pool.clone()),
            auth: AuthRepository::new(pool.clone()),
            pool,
        }
    }

    /// Pool handle for multi-statement transactions.
    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn database_handle_creation() {
        // Requires a running database; skipped when none is reachable.
        let pool = sqlx::PgPool::connect("postgresql://localhost/brotherhood_kos_test").await;
        if let Ok(pool) = pool {
            let db = Database::new(pool);
            assert!(!db.pool().is_closed());
        }
    }
}
