//! /console command handler
//!
//! Hands out a one-time code for the REST API, delivered in a private
//! chat only.

use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode};
use tracing::{debug, warn};

use crate::models::Actor;
use crate::services::ServiceFactory;
use crate::utils::errors::Result;

/// Handle /console - generate an API authentication code
pub async fn handle_console(bot: Bot, msg: Message, services: ServiceFactory) -> Result<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let chat_id = msg.chat.id;
    let actor = Actor::new(user.id.to_string(), user.full_name());

    debug!(user_id = %actor.id, "Processing /console command");

    let issued = match services.auth.create_auth_code(&actor).await {
        Ok(issued) => issued,
        Err(e) => {
            bot.send_message(chat_id, e.user_message()).await?;
            return Ok(());
        }
    };

    let text = format!(
        "🔐 *API Authentication Code*\n\n\
         Your code: `{}`\n\
         Expires: {}\n\n\
         How to use:\n\
         1. POST /api/auth/login with body `{{\"code\": \"{}\"}}`\n\
         2. Use the returned token as `Authorization: Bearer <token>`\n\n\
         ⚠️ Keep this code private! It can be used once.",
        issued.code,
        issued.expires_at.format("%Y-%m-%d %H:%M UTC"),
        issued.code
    );

    // The code only ever goes to the requester's private chat.
    let dm_chat = ChatId(user.id.0 as i64);
    match bot
        .send_message(dm_chat, text)
        .parse_mode(ParseMode::Markdown)
        .await
    {
        Ok(_) => {
            if !msg.chat.is_private() {
                bot.send_message(chat_id, "✅ Authentication code sent to your DMs!")
                    .await?;
            }
        }
        Err(e) => {
            warn!(user_id = %actor.id, error = %e, "Could not DM auth code");
            bot.send_message(
                chat_id,
                "❌ Could not send you a DM. Please open a private chat with the bot and try again.",
            )
            .await?;
        }
    }

    Ok(())
}
