//! Callback query handlers
//!
//! Dispatches confirm/cancel button presses for staged add/remove actions
//! and the management panel buttons.

use teloxide::payloads::{AnswerCallbackQuerySetters, EditMessageTextSetters};
use teloxide::prelude::*;
use teloxide::types::{
    CallbackQuery, ChatId, InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::Settings;
use crate::handlers::commands::manage;
use crate::models::Actor;
use crate::services::ServiceFactory;
use crate::state::{BotState, PendingAction, PendingRequest, TakeOutcome};
use crate::utils::errors::Result;

/// Route a callback query by its data prefix.
pub async fn handle_callback_query(
    bot: Bot,
    query: CallbackQuery,
    services: ServiceFactory,
    settings: Settings,
    state: BotState,
) -> Result<()> {
    let Some(data) = query.data.clone() else {
        bot.answer_callback_query(query.id.clone()).await?;
        return Ok(());
    };

    debug!(user_id = %query.from.id, data = %data, "Callback query received");

    if let Some(token) = data.strip_prefix("confirm_add:") {
        handle_confirmation(&bot, &query, token, true, &services, &state).await?;
    } else if let Some(token) = data.strip_prefix("cancel_add:") {
        handle_confirmation(&bot, &query, token, false, &services, &state).await?;
    } else if let Some(token) = data.strip_prefix("confirm_remove:") {
        handle_confirmation(&bot, &query, token, true, &services, &state).await?;
    } else if let Some(token) = data.strip_prefix("cancel_remove:") {
        handle_confirmation(&bot, &query, token, false, &services, &state).await?;
    } else if let Some(action) = data.strip_prefix("manage:") {
        handle_manage_action(&bot, &query, action, &services, &settings).await?;
    } else {
        warn!(data = %data, "Unknown callback data");
        bot.answer_callback_query(query.id.clone()).await?;
    }

    Ok(())
}

/// Resolve a confirm or cancel press against the pending map.
async fn handle_confirmation(
    bot: &Bot,
    query: &CallbackQuery,
    raw_token: &str,
    confirmed: bool,
    services: &ServiceFactory,
    state: &BotState,
) -> Result<()> {
    let presser_id = query.from.id.0 as i64;

    let Ok(token) = Uuid::parse_str(raw_token) else {
        bot.answer_callback_query(query.id.clone()).await?;
        return Ok(());
    };

    match state.confirmations.take_for(&token, presser_id) {
        TakeOutcome::Missing => {
            bot.answer_callback_query(query.id.clone())
                .text("This confirmation has expired.")
                .await?;
        }
        TakeOutcome::WrongUser => {
            bot.answer_callback_query(query.id.clone())
                .text("Only the requester can confirm this action.")
                .await?;
        }
        TakeOutcome::Taken(request) => {
            bot.answer_callback_query(query.id.clone()).await?;
            if confirmed {
                execute_confirmed(bot, query, request, services).await?;
            } else {
                edit_prompt(bot, &request, "❌ Action cancelled.").await;
            }
        }
    }

    Ok(())
}

async fn execute_confirmed(
    bot: &Bot,
    query: &CallbackQuery,
    request: PendingRequest,
    services: &ServiceFactory,
) -> Result<()> {
    let actor = Actor::new(query.from.id.to_string(), query.from.full_name());

    let outcome = match &request.action {
        PendingAction::Add(add) => services
            .kos
            .add(&add.profile, &add.reason, &actor, add.expires_at, add.is_permanent)
            .await
            .map(|entry| {
                format!(
                    "🚨 *{}* ({}) added to the KOS list.\nReason: {}",
                    entry.roblox_username, entry.roblox_user_id, entry.reason
                )
            }),
        PendingAction::Remove(remove) => services
            .kos
            .remove(&remove.roblox_user_id, &remove.reason, &actor)
            .await
            .map(|entry| {
                format!(
                    "✅ *{}* ({}) removed from the KOS list.",
                    entry.roblox_username, entry.roblox_user_id
                )
            }),
    };

    let text = match outcome {
        Ok(text) => text,
        Err(e) => e.user_message(),
    };
    edit_prompt(bot, &request, &text).await;

    Ok(())
}

/// Replace the prompt message; the inline keyboard disappears with the edit.
async fn edit_prompt(bot: &Bot, request: &PendingRequest, text: &str) {
    if let Err(e) = bot
        .edit_message_text(request.chat_id, request.message_id, text)
        .parse_mode(ParseMode::Markdown)
        .await
    {
        warn!(error = %e, "Failed to edit confirmation prompt");
    }
}

/// Management panel buttons; every press re-checks the admin session.
async fn handle_manage_action(
    bot: &Bot,
    query: &CallbackQuery,
    action: &str,
    services: &ServiceFactory,
    settings: &Settings,
) -> Result<()> {
    let user_id = query.from.id.0 as i64;
    let actor = Actor::new(query.from.id.to_string(), query.from.full_name());

    let authorized = manage::is_admin(settings, user_id)
        && services.admin.has_active_session(&actor.id).await?;
    if !authorized {
        bot.answer_callback_query(query.id.clone())
            .text("Session expired. Run /manage again.")
            .await?;
        return Ok(());
    }

    let Some((chat_id, message_id)) = prompt_location(query) else {
        bot.answer_callback_query(query.id.clone()).await?;
        return Ok(());
    };

    match action {
        "toggle" => {
            let enabled = services.admin.toggle_enabled(&actor).await?;
            bot.answer_callback_query(query.id.clone())
                .text(if enabled { "Bot enabled" } else { "Bot disabled" })
                .await?;
            rerender_panel(bot, chat_id, message_id, services).await?;
        }
        "refresh" => {
            bot.answer_callback_query(query.id.clone()).await?;
            rerender_panel(bot, chat_id, message_id, services).await?;
        }
        "sweep" => {
            let archived = services.kos.archive_expired().await?;
            bot.answer_callback_query(query.id.clone())
                .text(format!("Archived {archived} expired entries"))
                .await?;
            rerender_panel(bot, chat_id, message_id, services).await?;
        }
        "test" => {
            let ok = services.notifications.test_connection().await;
            bot.answer_callback_query(query.id.clone())
                .text(if ok {
                    "Test notification sent"
                } else {
                    "Notification channel not working"
                })
                .await?;
        }
        "logs" => {
            bot.answer_callback_query(query.id.clone()).await?;
            let logs = services.kos.recent_logs(10, None).await?;
            let mut text = "📜 *Recent logs*\n".to_string();
            if logs.is_empty() {
                text.push_str("\nNo log entries yet.");
            }
            for record in &logs {
                text.push_str(&format!(
                    "\n`{}` [{}/{}] {}",
                    record.created_at.format("%m-%d %H:%M"),
                    record.level,
                    record.category,
                    record.message
                ));
            }
            let back = InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
                "⬅️ Back",
                "manage:back",
            )]]);
            bot.edit_message_text(chat_id, message_id, text)
                .parse_mode(ParseMode::Markdown)
                .reply_markup(back)
                .await?;
        }
        "back" => {
            bot.answer_callback_query(query.id.clone()).await?;
            rerender_panel(bot, chat_id, message_id, services).await?;
        }
        "close" => {
            services.admin.end_sessions(&actor).await?;
            bot.answer_callback_query(query.id.clone()).await?;
            bot.edit_message_text(chat_id, message_id, "Panel closed.")
                .await?;
        }
        other => {
            warn!(action = %other, "Unknown manage action");
            bot.answer_callback_query(query.id.clone()).await?;
        }
    }

    Ok(())
}

async fn rerender_panel(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    services: &ServiceFactory,
) -> Result<()> {
    let stats = services.kos.stats().await?;
    let enabled = services.admin.is_enabled().await?;

    bot.edit_message_text(chat_id, message_id, manage::panel_text(&stats, enabled))
        .parse_mode(ParseMode::Markdown)
        .reply_markup(manage::panel_keyboard(enabled))
        .await?;

    Ok(())
}

fn prompt_location(query: &CallbackQuery) -> Option<(ChatId, MessageId)> {
    match query.message.as_ref() {
        Some(teloxide::types::MaybeInaccessibleMessage::Regular(message)) => {
            Some((message.chat.id, message.id))
        }
        _ => None,
    }
}
