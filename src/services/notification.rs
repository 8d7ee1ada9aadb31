//! Notification dispatch
//!
//! Formats entry-lifecycle messages and posts them to the configured
//! notification chat. Strictly best-effort: dispatch happens on a spawned
//! task and failures are logged, never returned to the mutation path.

use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode};
use tracing::{debug, info, warn};

use crate::models::{Actor, KosEntry};
use crate::utils::errors::Result;

/// Entry-lifecycle events that produce a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KosEvent {
    Added,
    Removed,
    Expired,
}

/// Notification service for lifecycle messages
#[derive(Clone)]
pub struct NotificationService {
    bot: Bot,
    chat_id: Option<ChatId>,
}

impl NotificationService {
    /// Create a new NotificationService instance
    pub fn new(bot: Bot, notify_chat_id: Option<i64>) -> Self {
        Self {
            bot,
            chat_id: notify_chat_id.map(ChatId),
        }
    }

    /// Check if notifications are configured
    pub fn is_enabled(&self) -> bool {
        self.chat_id.is_some()
    }

    /// Fire-and-forget dispatch. Never blocks or fails the caller.
    pub fn dispatch(&self, event: KosEvent, entry: &KosEntry, actor: &Actor) {
        if !self.is_enabled() {
            debug!("Notifications disabled, skipping dispatch");
            return;
        }

        let service = self.clone();
        let entry = entry.clone();
        let actor = actor.clone();
        tokio::spawn(async move {
            if let Err(e) = service.send_now(event, &entry, &actor).await {
                warn!(
                    event = ?event,
                    roblox_user_id = %entry.roblox_user_id,
                    error = %e,
                    "Failed to send notification"
                );
            }
        });
    }

    /// Send a lifecycle notification and wait for the result.
    pub async fn send_now(&self, event: KosEvent, entry: &KosEntry, actor: &Actor) -> Result<()> {
        let Some(chat_id) = self.chat_id else {
            return Ok(());
        };

        let message = format_message(event, entry, actor);
        self.bot
            .send_message(chat_id, message)
            .parse_mode(ParseMode::Markdown)
            .await?;

        debug!(event = ?event, roblox_user_id = %entry.roblox_user_id, "Notification sent");
        Ok(())
    }

    /// Send a probe message to verify the configuration.
    pub async fn test_connection(&self) -> bool {
        let Some(chat_id) = self.chat_id else {
            return false;
        };

        match self
            .bot
            .send_message(chat_id, "🔧 *Test Message*\n\nNotification channel is working!")
            .parse_mode(ParseMode::Markdown)
            .await
        {
            Ok(_) => {
                info!("Notification test message sent");
                true
            }
            Err(e) => {
                warn!(error = %e, "Notification test failed");
                false
            }
        }
    }
}

/// Render the notification text for an event.
pub fn format_message(event: KosEvent, entry: &KosEntry, actor: &Actor) -> String {
    match event {
        KosEvent::Added => {
            let expiry = if entry.is_permanent {
                "⏰ Permanent".to_string()
            } else {
                match entry.expires_at {
                    Some(expires_at) => {
                        format!("⏰ Expires: {}", expires_at.format("%Y-%m-%d %H:%M UTC"))
                    }
                    None => "⏰ Expires: Never".to_string(),
                }
            };

            format!(
                "🚨 *KOS ENTRY ADDED*\n\nUser: {} ({})\nReason: {}\nAdded by: {}\n{}",
                entry.roblox_username, entry.roblox_user_id, entry.reason, actor.name, expiry
            )
        }
        KosEvent::Removed => format!(
            "✅ *KOS ENTRY REMOVED*\n\nUser: {} ({})\nRemoved by: {}",
            entry.roblox_username, entry.roblox_user_id, actor.name
        ),
        KosEvent::Expired => format!(
            "⏰ *KOS ENTRY EXPIRED*\n\nUser: {} ({})\nAutomatically archived",
            entry.roblox_username, entry.roblox_user_id
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn sample_entry(is_permanent: bool, expires: bool) -> KosEntry {
        let now = Utc::now();
        KosEntry {
            id: 7,
            roblox_user_id: "123".to_string(),
            roblox_username: "builderman".to_string(),
            reason: "griefing".to_string(),
            added_by_id: "42".to_string(),
            added_by_name: "mod".to_string(),
            expires_at: expires.then(|| now + Duration::days(7)),
            is_permanent,
            status: "active".to_string(),
            thumbnail_url: None,
            removed_by_id: None,
            removed_by_name: None,
            removed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn added_message_permanent() {
        let message = format_message(
            KosEvent::Added,
            &sample_entry(true, false),
            &Actor::new("42", "mod"),
        );
        assert!(message.starts_with("🚨 *KOS ENTRY ADDED*"));
        assert!(message.contains("builderman (123)"));
        assert!(message.contains("Reason: griefing"));
        assert!(message.contains("⏰ Permanent"));
    }

    #[test]
    fn added_message_with_expiry() {
        let message = format_message(
            KosEvent::Added,
            &sample_entry(false, true),
            &Actor::new("42", "mod"),
        );
        assert!(message.contains("⏰ Expires:"));
    }

    #[test]
    fn added_message_open_ended() {
        let message = format_message(
            KosEvent::Added,
            &sample_entry(false, false),
            &Actor::new("42", "mod"),
        );
        assert!(message.contains("⏰ Expires: Never"));
    }

    #[test]
    fn removed_and_expired_messages() {
        let entry = sample_entry(false, false);
        let removed = format_message(KosEvent::Removed, &entry, &Actor::new("42", "mod"));
        assert!(removed.starts_with("✅ *KOS ENTRY REMOVED*"));
        assert!(removed.contains("Removed by: mod"));

        let expired = format_message(KosEvent::Expired, &entry, &Actor::system());
        assert!(expired.starts_with("⏰ *KOS ENTRY EXPIRED*"));
        assert!(expired.contains("Automatically archived"));
    }
}
