//! Plain message handling
//!
//! The only non-command messages the bot cares about are admin password
//! attempts in a private chat after /manage.

use teloxide::prelude::*;

use crate::handlers::commands::manage;
use crate::services::ServiceFactory;
use crate::state::BotState;
use crate::utils::errors::Result;

pub async fn handle_message(
    bot: Bot,
    msg: Message,
    services: ServiceFactory,
    state: BotState,
) -> Result<()> {
    manage::handle_password_attempt(&bot, &msg, &services, &state).await?;
    Ok(())
}
