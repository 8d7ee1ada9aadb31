//! KOS entry lifecycle service
//!
//! Add, remove, list, stats, history and the expiry sweep. Every entry
//! mutation and its history record are committed in a single transaction;
//! notifications are dispatched after commit and never affect the result.

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::database::Database;
use crate::models::log::{category, level};
use crate::models::{
    config_value::keys, Actor, CreateEntryRequest, CreateHistoryRequest, HistoryAction,
    HistoryRecord, KosEntry, KosStats, ListFilter, LogRecord, Page,
};
use crate::services::notification::{KosEvent, NotificationService};
use crate::services::roblox::RobloxProfile;
use crate::utils::errors::{KosError, Result};

/// Hard cap on page size across both transports.
pub const MAX_PAGE_LIMIT: i64 = 100;

#[derive(Clone)]
pub struct KosService {
    db: Database,
    notifier: NotificationService,
    expiring_window: Duration,
}

impl KosService {
    pub fn new(db: Database, notifier: NotificationService, expiring_window_days: i64) -> Self {
        Self {
            db,
            notifier,
            expiring_window: Duration::days(expiring_window_days),
        }
    }

    /// Add a resolved Roblox user to the KOS list.
    ///
    /// Fails with `Conflict` when an active entry already exists. A
    /// previously archived user is reactivated on the same row instead of
    /// creating a duplicate.
    pub async fn add(
        &self,
        profile: &RobloxProfile,
        reason: &str,
        actor: &Actor,
        expires_at: Option<DateTime<Utc>>,
        is_permanent: bool,
    ) -> Result<KosEntry> {
        self.ensure_enabled().await?;

        let reason = reason.trim();
        if reason.is_empty() {
            return Err(KosError::Validation("Reason is required".to_string()));
        }
        if let Some(expires_at) = expires_at {
            if expires_at <= Utc::now() {
                return Err(KosError::Validation(
                    "Expiry must be in the future".to_string(),
                ));
            }
        }

        let request = CreateEntryRequest {
            roblox_user_id: profile.id.clone(),
            roblox_username: profile.name.clone(),
            reason: reason.to_string(),
            added_by: actor.clone(),
            // A permanent entry carries no time box.
            expires_at: if is_permanent { None } else { expires_at },
            is_permanent,
            thumbnail_url: profile.thumbnail_url.clone(),
        };

        let mut tx = self.db.pool().begin().await?;

        if self
            .db
            .entries
            .find_active_tx(&mut tx, &profile.id)
            .await?
            .is_some()
        {
            return Err(KosError::Conflict(
                "User is already on the KOS list".to_string(),
            ));
        }

        let previous = self.db.entries.find_latest_tx(&mut tx, &profile.id).await?;
        let entry = match previous {
            Some(prev) if prev.is_archived() => {
                self.db.entries.reactivate(&mut tx, prev.id, &request).await?
            }
            _ => match self.db.entries.insert(&mut tx, &request).await {
                Ok(entry) => entry,
                // Lost a race against a concurrent add; the partial unique
                // index on active entries backstops the check above.
                Err(KosError::Database(e)) if is_unique_violation(&e) => {
                    return Err(KosError::Conflict(
                        "User is already on the KOS list".to_string(),
                    ));
                }
                Err(e) => return Err(e),
            },
        };

        self.db
            .history
            .insert(
                &mut tx,
                &CreateHistoryRequest {
                    entry_id: entry.id,
                    roblox_user_id: entry.roblox_user_id.clone(),
                    roblox_username: entry.roblox_username.clone(),
                    action: HistoryAction::Added,
                    reason: Some(entry.reason.clone()),
                    performed_by: actor.clone(),
                },
            )
            .await?;

        tx.commit().await?;

        info!(
            roblox_user_id = %entry.roblox_user_id,
            roblox_username = %entry.roblox_username,
            added_by = %actor.name,
            "KOS entry added"
        );
        self.log_event(
            level::INFO,
            category::SERVICE,
            &format!("KOS entry added for {}", entry.roblox_username),
            Some(&actor.name),
        )
        .await;
        self.notifier.dispatch(KosEvent::Added, &entry, actor);

        Ok(entry)
    }

    /// Archive the active entry for a Roblox user.
    ///
    /// Fails with `NotFound` when the user has no active entry; the entry
    /// and its history survive as the audit record.
    pub async fn remove(
        &self,
        roblox_user_id: &str,
        reason: &str,
        actor: &Actor,
    ) -> Result<KosEntry> {
        self.ensure_enabled().await?;

        let mut tx = self.db.pool().begin().await?;

        let Some(existing) = self
            .db
            .entries
            .find_active_tx(&mut tx, roblox_user_id)
            .await?
        else {
            return Err(KosError::NotFound(
                "User is not on the KOS list".to_string(),
            ));
        };

        let now = Utc::now();
        let entry = self.db.entries.archive(&mut tx, existing.id, actor, now).await?;

        self.db
            .history
            .insert(
                &mut tx,
                &CreateHistoryRequest {
                    entry_id: entry.id,
                    roblox_user_id: entry.roblox_user_id.clone(),
                    roblox_username: entry.roblox_username.clone(),
                    action: HistoryAction::Removed,
                    reason: Some(reason.to_string()),
                    performed_by: actor.clone(),
                },
            )
            .await?;

        tx.commit().await?;

        info!(
            roblox_user_id = %entry.roblox_user_id,
            roblox_username = %entry.roblox_username,
            removed_by = %actor.name,
            "KOS entry removed"
        );
        self.log_event(
            level::INFO,
            category::SERVICE,
            &format!("KOS entry removed for {}", entry.roblox_username),
            Some(&actor.name),
        )
        .await;
        self.notifier.dispatch(KosEvent::Removed, &entry, actor);

        Ok(entry)
    }

    /// Current active entry for a Roblox user, if any.
    pub async fn find(&self, roblox_user_id: &str) -> Result<Option<KosEntry>> {
        self.db.entries.find_active(roblox_user_id).await
    }

    /// Active entry looked up by numeric id or stored username.
    pub async fn find_by_id_or_name(&self, query: &str) -> Result<Option<KosEntry>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(KosError::Validation("Username is required".to_string()));
        }

        if query.chars().all(|c| c.is_ascii_digit()) {
            self.db.entries.find_active(query).await
        } else {
            self.db.entries.find_active_by_name(query).await
        }
    }

    /// Filtered entry listing, newest first.
    pub async fn list(
        &self,
        filter: ListFilter,
        page: i64,
        limit: i64,
    ) -> Result<Page<KosEntry>> {
        let (page, limit) = validate_page(page, limit)?;
        let window_end = Utc::now() + self.expiring_window;
        let offset = (page - 1) * limit;

        let (items, total) = futures::try_join!(
            self.db.entries.list(filter, window_end, limit, offset),
            self.db.entries.count(filter, window_end),
        )?;

        Ok(Page::new(items, page, limit, total))
    }

    /// Aggregate entry counts.
    pub async fn stats(&self) -> Result<KosStats> {
        let window_end = Utc::now() + self.expiring_window;

        let (active, permanent, expiring, archived) = futures::try_join!(
            self.db.entries.count(ListFilter::Active, window_end),
            self.db.entries.count(ListFilter::Permanent, window_end),
            self.db.entries.count(ListFilter::Expiring, window_end),
            self.db.entries.count(ListFilter::Archived, window_end),
        )?;

        Ok(KosStats {
            active,
            permanent,
            expiring,
            archived,
            total: active + archived,
        })
    }

    /// Archive every active, non-permanent entry whose expiry has passed.
    ///
    /// Idempotent: a second run right after the first archives nothing.
    /// Returns the number of entries archived.
    pub async fn archive_expired(&self) -> Result<usize> {
        let now = Utc::now();
        let system = Actor::system();

        let mut tx = self.db.pool().begin().await?;
        let candidates = self.db.entries.expired_candidates(&mut tx, now).await?;

        let mut archived = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let entry = self
                .db
                .entries
                .archive(&mut tx, candidate.id, &system, now)
                .await?;
            self.db
                .history
                .insert(
                    &mut tx,
                    &CreateHistoryRequest {
                        entry_id: entry.id,
                        roblox_user_id: entry.roblox_user_id.clone(),
                        roblox_username: entry.roblox_username.clone(),
                        action: HistoryAction::Expired,
                        reason: Some("Entry expired automatically".to_string()),
                        performed_by: system.clone(),
                    },
                )
                .await?;
            archived.push(entry);
        }

        tx.commit().await?;

        if !archived.is_empty() {
            info!(count = archived.len(), "Archived expired KOS entries");
            self.log_event(
                level::INFO,
                category::SYSTEM,
                &format!("Archived {} expired KOS entries", archived.len()),
                None,
            )
            .await;
            for entry in &archived {
                self.notifier.dispatch(KosEvent::Expired, entry, &system);
            }
        }

        Ok(archived.len())
    }

    /// Paged audit trail, newest first.
    pub async fn history(&self, page: i64, limit: i64) -> Result<Page<HistoryRecord>> {
        let (page, limit) = validate_page(page, limit)?;
        let offset = (page - 1) * limit;

        let (items, total) = futures::try_join!(
            self.db.history.list(limit, offset),
            self.db.history.count(),
        )?;

        Ok(Page::new(items, page, limit, total))
    }

    /// Recent audit records for one entry.
    pub async fn entry_history(&self, entry_id: i64, limit: i64) -> Result<Vec<HistoryRecord>> {
        self.db.history.for_entry(entry_id, limit).await
    }

    /// Recent operational log lines for the admin panel.
    pub async fn recent_logs(
        &self,
        limit: i64,
        category: Option<&str>,
    ) -> Result<Vec<LogRecord>> {
        self.db.logs.recent(limit, category).await
    }

    async fn ensure_enabled(&self) -> Result<()> {
        let enabled = self.db.config.get_bool(keys::BOT_ENABLED, true).await?;
        if !enabled {
            return Err(KosError::Validation(
                "The KOS system is currently disabled".to_string(),
            ));
        }
        Ok(())
    }

    /// Operational log row; failures degrade to a tracing warning so they
    /// never fail the primary operation.
    async fn log_event(&self, level: &str, category: &str, message: &str, actor: Option<&str>) {
        if let Err(e) = self.db.logs.append(level, category, message, actor).await {
            warn!(error = %e, message = message, "Failed to write operational log");
        }
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

fn validate_page(page: i64, limit: i64) -> Result<(i64, i64)> {
    if page < 1 {
        return Err(KosError::Validation("Page must be at least 1".to_string()));
    }
    if limit < 1 || limit > MAX_PAGE_LIMIT {
        return Err(KosError::Validation(format!(
            "Limit must be between 1 and {MAX_PAGE_LIMIT}"
        )));
    }
    Ok((page, limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn page_validation() {
        assert_eq!(validate_page(1, 10).unwrap(), (1, 10));
        assert_eq!(validate_page(3, MAX_PAGE_LIMIT).unwrap(), (3, MAX_PAGE_LIMIT));
        assert_matches!(validate_page(0, 10), Err(KosError::Validation(_)));
        assert_matches!(validate_page(1, 0), Err(KosError::Validation(_)));
        assert_matches!(
            validate_page(1, MAX_PAGE_LIMIT + 1),
            Err(KosError::Validation(_))
        );
    }
}
