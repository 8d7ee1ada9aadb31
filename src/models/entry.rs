//! KOS entry model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::Actor;
use crate::utils::errors::{KosError, Result};

/// Lifecycle states of a KOS entry.
///
/// `NONE → ACTIVE` on add, `ACTIVE → ARCHIVED` on remove or expiry,
/// `ARCHIVED → ACTIVE` on re-add. Entries are never hard-deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryStatus {
    Active,
    Archived,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Active => "active",
            EntryStatus::Archived => "archived",
        }
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct KosEntry {
    pub id: i64,
    pub roblox_user_id: String,
    pub roblox_username: String,
    pub reason: String,
    pub added_by_id: String,
    pub added_by_name: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_permanent: bool,
    pub status: String,
    pub thumbnail_url: Option<String>,
    pub removed_by_id: Option<String>,
    pub removed_by_name: Option<String>,
    pub removed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl KosEntry {
    pub fn is_active(&self) -> bool {
        self.status == EntryStatus::Active.as_str()
    }

    pub fn is_archived(&self) -> bool {
        self.status == EntryStatus::Archived.as_str()
    }

    /// Whether the entry's time box has elapsed. Permanent entries and
    /// entries without an expiry never count as expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        if self.is_permanent {
            return false;
        }
        match self.expires_at {
            Some(expires_at) => now > expires_at,
            None => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEntryRequest {
    pub roblox_user_id: String,
    pub roblox_username: String,
    pub reason: String,
    pub added_by: Actor,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_permanent: bool,
    pub thumbnail_url: Option<String>,
}

/// Listing filters over the KOS table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFilter {
    Active,
    /// Active, non-permanent entries expiring within the configured window.
    Expiring,
    /// Active entries flagged permanent.
    Permanent,
    Archived,
}

impl ListFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListFilter::Active => "active",
            ListFilter::Expiring => "expiring",
            ListFilter::Permanent => "permanent",
            ListFilter::Archived => "archived",
        }
    }

    pub fn parse(input: &str) -> Result<Self> {
        match input.trim().to_lowercase().as_str() {
            "active" => Ok(ListFilter::Active),
            "expiring" | "expiring-soon" => Ok(ListFilter::Expiring),
            "permanent" => Ok(ListFilter::Permanent),
            "archived" => Ok(ListFilter::Archived),
            other => Err(KosError::Validation(format!(
                "Unknown filter '{other}'. Expected one of: active, expiring, permanent, archived"
            ))),
        }
    }
}

impl std::fmt::Display for ListFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
