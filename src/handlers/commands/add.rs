//! /add command handler
//!
//! Resolves the target against the Roblox directory, then asks for an
//! explicit confirm/cancel before touching the list.

use chrono::Utc;
use teloxide::payloads::EditMessageTextSetters;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::services::ServiceFactory;
use crate::state::{
    BotState, PendingAction, PendingAdd, PendingRequest, CONFIRM_TIMEOUT_SECS,
};
use crate::utils::duration::parse_duration;
use crate::utils::errors::{KosError, Result};

const USAGE: &str = "Usage: /add <username> [duration|permanent] <reason>\n\
    Examples:\n  /add builderman 7d griefing at spawn\n  /add builderman permanent alt account";

#[derive(Debug, PartialEq)]
pub struct AddArgs {
    pub username: String,
    pub duration: Option<chrono::Duration>,
    pub is_permanent: bool,
    pub reason: String,
}

/// Parse `/add` arguments: username, optional duration token, reason rest.
pub fn parse_add_args(input: &str) -> Result<AddArgs> {
    let mut parts = input.split_whitespace();
    let username = parts
        .next()
        .ok_or_else(|| KosError::Validation(USAGE.to_string()))?
        .to_string();

    let rest: Vec<&str> = parts.collect();
    if rest.is_empty() {
        return Err(KosError::Validation(USAGE.to_string()));
    }

    let (duration, is_permanent, reason_parts) = match rest[0] {
        "permanent" | "perm" => (None, true, &rest[1..]),
        token => match parse_duration(token) {
            Ok(duration) => (Some(duration), false, &rest[1..]),
            // Not a duration token; the whole tail is the reason.
            Err(_) => (None, false, &rest[..]),
        },
    };

    let reason = reason_parts.join(" ");
    if reason.trim().is_empty() {
        return Err(KosError::Validation(USAGE.to_string()));
    }

    Ok(AddArgs {
        username,
        duration,
        is_permanent,
        reason,
    })
}

/// Handle /add - stage an addition behind a confirmation prompt
pub async fn handle_add(
    bot: Bot,
    msg: Message,
    args: String,
    services: ServiceFactory,
    state: BotState,
) -> Result<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let invoker_id = user.id.0 as i64;
    let chat_id = msg.chat.id;

    debug!(user_id = invoker_id, "Processing /add command");

    let args = match parse_add_args(&args) {
        Ok(args) => args,
        Err(e) => {
            bot.send_message(chat_id, e.user_message()).await?;
            return Ok(());
        }
    };

    let progress = bot
        .send_message(chat_id, "🔍 Looking up Roblox user...")
        .await?;

    let profile = match services.roblox.resolve(&args.username).await {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            bot.edit_message_text(
                chat_id,
                progress.id,
                format!(
                    "❌ Could not find Roblox user: *{}*\nPlease check the username and try again.",
                    args.username
                ),
            )
            .parse_mode(ParseMode::Markdown)
            .await?;
            return Ok(());
        }
        Err(e) => {
            warn!(error = %e, username = %args.username, "Roblox lookup failed");
            bot.edit_message_text(chat_id, progress.id, e.user_message())
                .await?;
            return Ok(());
        }
    };

    let expires_at = args.duration.map(|d| Utc::now() + d);
    let expiry_line = if args.is_permanent {
        "Permanent".to_string()
    } else {
        match expires_at {
            Some(expires_at) => format!("Expires: {}", expires_at.format("%Y-%m-%d %H:%M UTC")),
            None => "No expiry".to_string(),
        }
    };

    let token = Uuid::new_v4();
    let text = format!(
        "⚠️ *Confirm KOS Entry*\n\n\
         Roblox Username: {}\nUser ID: {}\nReason: {}\nDuration: {}\nAdded by: {}\n\n\
         This prompt expires in {CONFIRM_TIMEOUT_SECS} seconds.",
        profile.name, profile.id, args.reason, expiry_line, user.full_name()
    );
    let keyboard = InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("✅ Confirm", format!("confirm_add:{token}")),
        InlineKeyboardButton::callback("❌ Cancel", format!("cancel_add:{token}")),
    ]]);

    bot.edit_message_text(chat_id, progress.id, text)
        .parse_mode(ParseMode::Markdown)
        .reply_markup(keyboard)
        .await?;

    // Timeout path: clears the slot exactly once, then disarms the prompt.
    let confirmations = state.confirmations.clone();
    let timeout_bot = bot.clone();
    let message_id = progress.id;
    let timeout = tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_secs(CONFIRM_TIMEOUT_SECS)).await;
        if confirmations.expire(&token).is_some() {
            let _ = timeout_bot
                .edit_message_text(
                    chat_id,
                    message_id,
                    "⏱️ Confirmation timed out. Please try again.",
                )
                .await;
        }
    });

    state.confirmations.insert(
        token,
        PendingRequest {
            invoker_id,
            chat_id,
            message_id: progress.id,
            action: PendingAction::Add(PendingAdd {
                profile,
                reason: args.reason,
                expires_at,
                is_permanent: args.is_permanent,
            }),
        },
        Some(timeout),
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Duration;

    #[test]
    fn parses_duration_form() {
        let args = parse_add_args("builderman 7d griefing at spawn").unwrap();
        assert_eq!(args.username, "builderman");
        assert_eq!(args.duration, Some(Duration::days(7)));
        assert!(!args.is_permanent);
        assert_eq!(args.reason, "griefing at spawn");
    }

    #[test]
    fn parses_permanent_form() {
        let args = parse_add_args("builderman permanent alt account").unwrap();
        assert!(args.is_permanent);
        assert_eq!(args.duration, None);
        assert_eq!(args.reason, "alt account");
    }

    #[test]
    fn plain_reason_has_no_expiry() {
        let args = parse_add_args("builderman griefing at spawn").unwrap();
        assert_eq!(args.duration, None);
        assert!(!args.is_permanent);
        assert_eq!(args.reason, "griefing at spawn");
    }

    #[test]
    fn rejects_missing_reason() {
        assert_matches!(parse_add_args("builderman"), Err(KosError::Validation(_)));
        assert_matches!(parse_add_args("builderman 7d"), Err(KosError::Validation(_)));
        assert_matches!(parse_add_args(""), Err(KosError::Validation(_)));
    }
}
