//! Services module
//!
//! This module contains business logic services

pub mod admin;
pub mod auth;
pub mod kos;
pub mod notification;
pub mod roblox;

// Re-export commonly used services
pub use admin::AdminService;
pub use auth::AuthService;
pub use kos::KosService;
pub use notification::{KosEvent, NotificationService};
pub use roblox::{RobloxProfile, RobloxService};

use teloxide::Bot;

use crate::config::Settings;
use crate::database::Database;
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub kos: KosService,
    pub roblox: RobloxService,
    pub notifications: NotificationService,
    pub auth: AuthService,
    pub admin: AdminService,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(bot: Bot, settings: &Settings, db: Database) -> Result<Self> {
        let notifications = NotificationService::new(bot, settings.bot.notify_chat_id);
        let kos = KosService::new(
            db.clone(),
            notifications.clone(),
            settings.sweep.expiring_window_days,
        );
        let roblox = RobloxService::new(settings.roblox.clone())?;
        let auth = AuthService::new(
            db.clone(),
            settings.api.shared_secret.clone(),
            settings.api.code_ttl_minutes,
            settings.api.session_ttl_hours,
        );
        let admin = AdminService::new(
            db,
            settings.api.shared_secret.clone(),
            settings.api.admin_session_ttl_minutes,
        );

        Ok(Self {
            kos,
            roblox,
            notifications,
            auth,
            admin,
        })
    }
}
