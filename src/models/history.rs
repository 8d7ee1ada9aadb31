//! KOS history model
//!
//! Append-only audit trail: one row per action against an entry, never
//! mutated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::Actor;

/// Recorded audit actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryAction {
    Added,
    Removed,
    Archived,
    Expired,
    StatusChanged,
}

impl HistoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryAction::Added => "added",
            HistoryAction::Removed => "removed",
            HistoryAction::Archived => "archived",
            HistoryAction::Expired => "expired",
            HistoryAction::StatusChanged => "status_changed",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "added" => Some(HistoryAction::Added),
            "removed" => Some(HistoryAction::Removed),
            "archived" => Some(HistoryAction::Archived),
            "expired" => Some(HistoryAction::Expired),
            "status_changed" => Some(HistoryAction::StatusChanged),
            _ => None,
        }
    }
}

impl std::fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HistoryRecord {
    pub id: i64,
    pub entry_id: i64,
    pub roblox_user_id: String,
    pub roblox_username: String,
    pub action: String,
    pub reason: Option<String>,
    pub performed_by_id: String,
    pub performed_by_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateHistoryRequest {
    pub entry_id: i64,
    pub roblox_user_id: String,
    pub roblox_username: String,
    pub action: HistoryAction,
    pub reason: Option<String>,
    pub performed_by: Actor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_round_trip() {
        for action in [
            HistoryAction::Added,
            HistoryAction::Removed,
            HistoryAction::Archived,
            HistoryAction::Expired,
            HistoryAction::StatusChanged,
        ] {
            assert_eq!(HistoryAction::parse(action.as_str()), Some(action));
        }
        assert_eq!(HistoryAction::parse("vanished"), None);
    }
}
