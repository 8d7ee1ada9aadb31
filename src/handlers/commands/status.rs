//! /status command handler
//!
//! Without arguments: system statistics. With a username or id: that
//! user's KOS status plus recent audit records.

use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::debug;

use crate::models::{HistoryRecord, KosEntry, KosStats};
use crate::services::ServiceFactory;
use crate::utils::errors::Result;

const HISTORY_PREVIEW: i64 = 5;

pub fn format_stats(stats: &KosStats, enabled: bool) -> String {
    format!(
        "📊 *KOS System Status*\n\n\
         Bot: {}\n\
         Active entries: {}\n\
         Permanent: {}\n\
         Expiring soon: {}\n\
         Archived: {}\n\
         Total: {}",
        if enabled { "🟢 Enabled" } else { "🔴 Disabled" },
        stats.active,
        stats.permanent,
        stats.expiring,
        stats.archived,
        stats.total
    )
}

pub fn format_entry_status(entry: &KosEntry, history: &[HistoryRecord]) -> String {
    let expiry = if entry.is_permanent {
        "Permanent".to_string()
    } else {
        match entry.expires_at {
            Some(expires_at) => format!("Expires {}", expires_at.format("%Y-%m-%d %H:%M UTC")),
            None => "No expiry".to_string(),
        }
    };

    let mut text = format!(
        "🔴 *{}* ({}) is on the KOS list\n\nReason: {}\n{}\nAdded by: {}\nAdded: {}",
        entry.roblox_username,
        entry.roblox_user_id,
        entry.reason,
        expiry,
        entry.added_by_name,
        entry.created_at.format("%Y-%m-%d %H:%M UTC")
    );

    if !history.is_empty() {
        text.push_str("\n\nRecent history:");
        for record in history {
            text.push_str(&format!(
                "\n• {} - {} by {}",
                record.created_at.format("%Y-%m-%d"),
                record.action,
                record.performed_by_name
            ));
        }
    }

    text
}

/// Handle /status - system stats or a single user's status
pub async fn handle_status(
    bot: Bot,
    msg: Message,
    args: String,
    services: ServiceFactory,
) -> Result<()> {
    let chat_id = msg.chat.id;
    let query = args.trim();
    debug!(chat_id = ?chat_id, query = %query, "Processing /status command");

    if query.is_empty() {
        let text = match (services.kos.stats().await, services.admin.is_enabled().await) {
            (Ok(stats), Ok(enabled)) => format_stats(&stats, enabled),
            (Err(e), _) | (_, Err(e)) => e.user_message(),
        };
        bot.send_message(chat_id, text)
            .parse_mode(ParseMode::Markdown)
            .await?;
        return Ok(());
    }

    let text = match services.kos.find_by_id_or_name(query).await {
        Ok(Some(entry)) => {
            let history = services
                .kos
                .entry_history(entry.id, HISTORY_PREVIEW)
                .await
                .unwrap_or_default();
            format_entry_status(&entry, &history)
        }
        Ok(None) => format!("🟢 *{query}* is not on the KOS list."),
        Err(e) => e.user_message(),
    };

    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::Markdown)
        .await?;

    Ok(())
}
