//! /list command handler

use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::debug;

use crate::models::{KosEntry, ListFilter, Page};
use crate::services::ServiceFactory;
use crate::utils::errors::Result;

const PAGE_SIZE: i64 = 10;

/// Parse `/list [filter] [page]`.
pub fn parse_list_args(input: &str) -> Result<(ListFilter, i64)> {
    let mut parts = input.split_whitespace();

    let filter = match parts.next() {
        Some(raw) => match raw.parse::<i64>() {
            // A bare number is a page over the default filter.
            Ok(page) => return Ok((ListFilter::Active, page)),
            Err(_) => ListFilter::parse(raw)?,
        },
        None => ListFilter::Active,
    };

    let page = match parts.next() {
        Some(raw) => raw.parse::<i64>().unwrap_or(1),
        None => 1,
    };

    Ok((filter, page))
}

/// Render one page of entries as a chat message.
pub fn format_page(filter: ListFilter, page: &Page<KosEntry>) -> String {
    if page.items.is_empty() {
        return format!("📋 No {} entries found.", filter);
    }

    let mut lines = vec![format!(
        "📋 *KOS Entries* - filter: {} (page {}/{}, {} total)\n",
        filter, page.page, page.total_pages, page.total
    )];

    for entry in &page.items {
        let expiry = if entry.is_permanent {
            "permanent".to_string()
        } else {
            match entry.expires_at {
                Some(expires_at) => format!("expires {}", expires_at.format("%Y-%m-%d")),
                None => "no expiry".to_string(),
            }
        };
        lines.push(format!(
            "• *{}* ({}) - {} - {} - added by {}",
            entry.roblox_username, entry.roblox_user_id, entry.reason, expiry, entry.added_by_name
        ));
    }

    lines.join("\n")
}

/// Handle /list - show a page of KOS entries
pub async fn handle_list(
    bot: Bot,
    msg: Message,
    args: String,
    services: ServiceFactory,
) -> Result<()> {
    let chat_id = msg.chat.id;
    debug!(chat_id = ?chat_id, args = %args, "Processing /list command");

    let (filter, page) = match parse_list_args(&args) {
        Ok(parsed) => parsed,
        Err(e) => {
            bot.send_message(chat_id, e.user_message()).await?;
            return Ok(());
        }
    };

    match services.kos.list(filter, page, PAGE_SIZE).await {
        Ok(page) => {
            bot.send_message(chat_id, format_page(filter, &page))
                .parse_mode(ParseMode::Markdown)
                .await?;
        }
        Err(e) => {
            bot.send_message(chat_id, e.user_message()).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn parses_filter_and_page() {
        assert_eq!(
            parse_list_args("archived 2").unwrap(),
            (ListFilter::Archived, 2)
        );
        assert_eq!(parse_list_args("").unwrap(), (ListFilter::Active, 1));
        assert_eq!(parse_list_args("3").unwrap(), (ListFilter::Active, 3));
        assert_eq!(
            parse_list_args("expiring").unwrap(),
            (ListFilter::Expiring, 1)
        );
        assert!(parse_list_args("bogus").is_err());
    }

    #[test]
    fn formats_empty_page() {
        let page: Page<KosEntry> = Page::new(vec![], 1, 10, 0);
        assert!(format_page(ListFilter::Active, &page).contains("No active entries"));
    }

    #[test]
    fn formats_entries_with_expiry_labels() {
        let now = Utc::now();
        let entry = KosEntry {
            id: 1,
            roblox_user_id: "123".to_string(),
            roblox_username: "builderman".to_string(),
            reason: "griefing".to_string(),
            added_by_id: "42".to_string(),
            added_by_name: "mod".to_string(),
            expires_at: None,
            is_permanent: true,
            status: "active".to_string(),
            thumbnail_url: None,
            removed_by_id: None,
            removed_by_name: None,
            removed_at: None,
            created_at: now,
            updated_at: now,
        };
        let page = Page::new(vec![entry], 1, 10, 1);
        let text = format_page(ListFilter::Active, &page);
        assert!(text.contains("builderman"));
        assert!(text.contains("permanent"));
        assert!(text.contains("added by mod"));
    }
}
