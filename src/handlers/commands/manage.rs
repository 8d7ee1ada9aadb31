//! /manage command handler
//!
//! Password-gated management panel. Runs only in a private chat: the
//! command prompts for the admin password, the next message in that chat
//! is treated as the attempt, and success mints a short-lived admin
//! session that the panel buttons check on every press.

use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};
use tracing::debug;

use crate::config::Settings;
use crate::services::ServiceFactory;
use crate::state::{BotState, PROMPT_TIMEOUT_SECS};
use crate::utils::errors::Result;
use crate::utils::logging;

pub fn is_admin(settings: &Settings, user_id: i64) -> bool {
    settings.bot.admin_ids.contains(&user_id)
}

/// Handle /manage - authenticate and open the management panel
pub async fn handle_manage(
    bot: Bot,
    msg: Message,
    services: ServiceFactory,
    settings: Settings,
    state: BotState,
) -> Result<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let user_id = user.id.0 as i64;
    let chat_id = msg.chat.id;

    debug!(user_id = user_id, "Processing /manage command");

    if !msg.chat.is_private() {
        bot.send_message(chat_id, "🔐 Use /manage in a private chat with the bot.")
            .await?;
        return Ok(());
    }

    if !is_admin(&settings, user_id) {
        bot.send_message(chat_id, "❌ You are not authorized to manage the bot.")
            .await?;
        return Ok(());
    }

    // A still-valid admin session skips the password prompt.
    if services.admin.has_active_session(&user_id.to_string()).await? {
        show_panel(&bot, chat_id, &services).await?;
        return Ok(());
    }

    state.prompts.begin(user_id);
    bot.send_message(
        chat_id,
        format!(
            "🔐 *Admin Authentication Required*\n\n\
             Reply with the admin password to continue.\n\
             This prompt expires in {PROMPT_TIMEOUT_SECS} seconds."
        ),
    )
    .parse_mode(ParseMode::Markdown)
    .await?;

    Ok(())
}

/// Render the management panel.
pub async fn show_panel(bot: &Bot, chat_id: ChatId, services: &ServiceFactory) -> Result<()> {
    let stats = services.kos.stats().await?;
    let enabled = services.admin.is_enabled().await?;

    bot.send_message(chat_id, panel_text(&stats, enabled))
        .parse_mode(ParseMode::Markdown)
        .reply_markup(panel_keyboard(enabled))
        .await?;

    Ok(())
}

pub fn panel_text(stats: &crate::models::KosStats, enabled: bool) -> String {
    format!(
        "🛠️ *Bot Management Panel*\n\n\
         Bot status: {}\n\
         Active entries: {}\n\
         Expiring soon: {}\n\
         Archived entries: {}",
        if enabled { "🟢 Enabled" } else { "🔴 Disabled" },
        stats.active,
        stats.expiring,
        stats.archived
    )
}

pub fn panel_keyboard(enabled: bool) -> InlineKeyboardMarkup {
    let toggle_label = if enabled { "🔴 Disable bot" } else { "🟢 Enable bot" };
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback(toggle_label, "manage:toggle"),
            InlineKeyboardButton::callback("📊 Refresh stats", "manage:refresh"),
        ],
        vec![
            InlineKeyboardButton::callback("🗄️ Run expiry sweep", "manage:sweep"),
            InlineKeyboardButton::callback("📨 Test notification", "manage:test"),
        ],
        vec![
            InlineKeyboardButton::callback("📜 Recent logs", "manage:logs"),
            InlineKeyboardButton::callback("✖️ Close", "manage:close"),
        ],
    ])
}

/// Handle a password attempt in a private chat.
///
/// Returns true when the message was consumed as a password attempt.
pub async fn handle_password_attempt(
    bot: &Bot,
    msg: &Message,
    services: &ServiceFactory,
    state: &BotState,
) -> Result<bool> {
    let Some(user) = msg.from() else {
        return Ok(false);
    };
    let user_id = user.id.0 as i64;

    if !msg.chat.is_private() || !state.prompts.is_waiting(user_id) {
        return Ok(false);
    }
    let Some(candidate) = msg.text() else {
        return Ok(false);
    };

    if !state.prompts.take(user_id) {
        return Ok(false);
    }

    // The attempt should not linger in the chat history.
    let _ = bot.delete_message(msg.chat.id, msg.id).await;

    match services.admin.verify_password(candidate).await {
        Ok(true) => {
            let actor = crate::models::Actor::new(user.id.to_string(), user.full_name());
            services.admin.create_session(&actor).await?;
            logging::log_admin_auth(&actor.id, true);
            bot.send_message(msg.chat.id, "✅ Authenticated.").await?;
            show_panel(bot, msg.chat.id, services).await?;
        }
        Ok(false) => {
            logging::log_admin_auth(&user.id.to_string(), false);
            bot.send_message(msg.chat.id, "❌ Invalid password. Access denied.")
                .await?;
        }
        Err(e) => {
            bot.send_message(msg.chat.id, e.user_message()).await?;
        }
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, BotConfig, DatabaseConfig, LoggingConfig, RobloxConfig, SweepConfig};

    fn settings_with_admins(admin_ids: Vec<i64>) -> Settings {
        Settings {
            bot: BotConfig {
                token: "token".to_string(),
                admin_ids,
                notify_chat_id: None,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/kos".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            api: ApiConfig::default(),
            roblox: RobloxConfig::default(),
            sweep: SweepConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn admin_check() {
        let settings = settings_with_admins(vec![42, 7]);
        assert!(is_admin(&settings, 42));
        assert!(is_admin(&settings, 7));
        assert!(!is_admin(&settings, 99));
    }

    #[test]
    fn toggle_label_follows_state() {
        let enabled = panel_keyboard(true);
        let disabled = panel_keyboard(false);
        let first_label = |kb: &InlineKeyboardMarkup| kb.inline_keyboard[0][0].text.clone();
        assert!(first_label(&enabled).contains("Disable"));
        assert!(first_label(&disabled).contains("Enable"));
    }
}
