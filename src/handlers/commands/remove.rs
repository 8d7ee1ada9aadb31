//! /remove command handler

use teloxide::payloads::{EditMessageTextSetters, SendMessageSetters};
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};
use tracing::debug;
use uuid::Uuid;

use crate::services::ServiceFactory;
use crate::state::{
    BotState, PendingAction, PendingRemove, PendingRequest, CONFIRM_TIMEOUT_SECS,
};
use crate::utils::errors::{KosError, Result};

const USAGE: &str = "Usage: /remove <username> [reason]";

#[derive(Debug, PartialEq)]
pub struct RemoveArgs {
    pub username: String,
    pub reason: String,
}

pub fn parse_remove_args(input: &str) -> Result<RemoveArgs> {
    let mut parts = input.split_whitespace();
    let username = parts
        .next()
        .ok_or_else(|| KosError::Validation(USAGE.to_string()))?
        .to_string();

    let reason = parts.collect::<Vec<_>>().join(" ");
    let reason = if reason.trim().is_empty() {
        "Removed from KOS".to_string()
    } else {
        reason
    };

    Ok(RemoveArgs { username, reason })
}

/// Handle /remove - stage a removal behind a confirmation prompt
pub async fn handle_remove(
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

    debug!(user_id = invoker_id, "Processing /remove command");

    let args = match parse_remove_args(&args) {
        Ok(args) => args,
        Err(e) => {
            bot.send_message(chat_id, e.user_message()).await?;
            return Ok(());
        }
    };

    let entry = match services.kos.find_by_id_or_name(&args.username).await {
        Ok(Some(entry)) => entry,
        Ok(None) => {
            bot.send_message(
                chat_id,
                format!("❌ *{}* is not on the KOS list.", args.username),
            )
            .parse_mode(ParseMode::Markdown)
            .await?;
            return Ok(());
        }
        Err(e) => {
            bot.send_message(chat_id, e.user_message()).await?;
            return Ok(());
        }
    };

    let token = Uuid::new_v4();
    let text = format!(
        "⚠️ *Confirm KOS Removal*\n\n\
         Roblox Username: {}\nUser ID: {}\nOriginal reason: {}\nRemoval reason: {}\n\n\
         This prompt expires in {CONFIRM_TIMEOUT_SECS} seconds.",
        entry.roblox_username, entry.roblox_user_id, entry.reason, args.reason
    );
    let keyboard = InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("✅ Confirm", format!("confirm_remove:{token}")),
        InlineKeyboardButton::callback("❌ Cancel", format!("cancel_remove:{token}")),
    ]]);

    let prompt = bot
        .send_message(chat_id, text)
        .parse_mode(ParseMode::Markdown)
        .reply_markup(keyboard)
        .await?;

    let confirmations = state.confirmations.clone();
    let timeout_bot = bot.clone();
    let message_id = prompt.id;
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
            message_id: prompt.id,
            action: PendingAction::Remove(PendingRemove {
                roblox_user_id: entry.roblox_user_id,
                roblox_username: entry.roblox_username,
                reason: args.reason,
            }),
        },
        Some(timeout),
    );

    Ok(())
}
