//! Data models for the KOS domain

pub mod auth;
pub mod config_value;
pub mod entry;
pub mod history;
pub mod log;

pub use auth::{ApiSession, AuthCode, IssuedCode, IssuedSession};
pub use config_value::ConfigValue;
pub use entry::{CreateEntryRequest, EntryStatus, KosEntry, ListFilter};
pub use history::{CreateHistoryRequest, HistoryAction, HistoryRecord};
pub use log::LogRecord;

use serde::{Deserialize, Serialize};

/// Who performed an action: a chat user, an API session holder, or the
/// system itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Actor stamped on automatic actions such as the expiry sweep.
    pub fn system() -> Self {
        Self::new("system", "System")
    }
}

/// One page of results plus pagination arithmetic.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };
        Self {
            items,
            page,
            limit,
            total,
            total_pages,
        }
    }
}

/// Aggregate entry counts returned by the stats operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KosStats {
    pub active: i64,
    pub permanent: i64,
    pub expiring: i64,
    pub archived: i64,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_arithmetic() {
        let page: Page<i32> = Page::new(vec![1, 2, 3], 1, 10, 23);
        assert_eq!(page.total_pages, 3);

        let exact: Page<i32> = Page::new(vec![], 1, 10, 30);
        assert_eq!(exact.total_pages, 3);

        let empty: Page<i32> = Page::new(vec![], 1, 10, 0);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn system_actor() {
        let actor = Actor::system();
        assert_eq!(actor.id, "system");
        assert_eq!(actor.name, "System");
    }
}
