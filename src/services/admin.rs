//! Admin service implementation
//!
//! Password-gated management: Argon2 password verification, short-lived
//! admin-panel sessions, and the global bot_enabled switch.

use chrono::{Duration, Utc};
use tracing::{info, warn};

use crate::database::Database;
use crate::models::auth::session_kind;
use crate::models::config_value::keys;
use crate::models::log::{category, level};
use crate::models::{Actor, IssuedSession};
use crate::security::{password, signing};
use crate::utils::errors::{KosError, Result};

#[derive(Clone)]
pub struct AdminService {
    db: Database,
    secret: String,
    session_ttl: Duration,
}

impl AdminService {
    pub fn new(db: Database, secret: String, session_ttl_minutes: i64) -> Self {
        Self {
            db,
            secret,
            session_ttl: Duration::minutes(session_ttl_minutes),
        }
    }

    /// Set the admin password (stored as an Argon2 PHC string).
    pub async fn set_password(&self, new_password: &str) -> Result<()> {
        let hash = password::hash_password(new_password)?;
        self.db
            .config
            .set(
                keys::ADMIN_PASSWORD,
                serde_json::Value::String(hash),
                Some("Hashed admin password"),
            )
            .await?;

        info!("Admin password updated");
        Ok(())
    }

    /// Verify the admin password against the stored hash.
    ///
    /// A wrong password returns `Ok(false)`; only a missing configuration
    /// is an error.
    pub async fn verify_password(&self, candidate: &str) -> Result<bool> {
        let Some(stored) = self.db.config.get_string(keys::ADMIN_PASSWORD).await? else {
            return Err(KosError::Config(
                "Admin password not set. Run the set-password setup first.".to_string(),
            ));
        };

        Ok(password::verify_password(candidate, &stored))
    }

    /// Mint a short-lived admin-panel session after password verification.
    pub async fn create_session(&self, actor: &Actor) -> Result<IssuedSession> {
        let token = generate_token();
        let expires_at = Utc::now() + self.session_ttl;

        self.db
            .auth
            .insert_session(
                &signing::sign(token.as_bytes(), &self.secret),
                &actor.id,
                &actor.name,
                session_kind::ADMIN,
                expires_at,
            )
            .await?;

        info!(admin = %actor.name, "Admin session created");
        self.log_admin_event(&format!("Admin session created for {}", actor.name), &actor.name)
            .await;

        Ok(IssuedSession { token, expires_at })
    }

    /// Whether an actor currently holds an unexpired admin session.
    pub async fn has_active_session(&self, actor_id: &str) -> Result<bool> {
        self.db
            .auth
            .has_active_session(actor_id, session_kind::ADMIN, Utc::now())
            .await
    }

    /// Invalidate every admin session an actor holds.
    pub async fn end_sessions(&self, actor: &Actor) -> Result<()> {
        let removed = self
            .db
            .auth
            .delete_sessions_for_actor(&actor.id, session_kind::ADMIN)
            .await?;
        if removed > 0 {
            info!(admin = %actor.name, "Admin sessions ended");
        }
        Ok(())
    }

    /// Whether the KOS system accepts mutations.
    pub async fn is_enabled(&self) -> Result<bool> {
        self.db.config.get_bool(keys::BOT_ENABLED, true).await
    }

    /// Flip the bot_enabled switch; returns the new state.
    pub async fn toggle_enabled(&self, actor: &Actor) -> Result<bool> {
        let enabled = !self.is_enabled().await?;
        self.db
            .config
            .set(
                keys::BOT_ENABLED,
                serde_json::Value::Bool(enabled),
                Some("Whether KOS mutations are accepted"),
            )
            .await?;

        info!(admin = %actor.name, enabled = enabled, "Bot status toggled");
        self.log_admin_event(
            &format!(
                "Bot {} by {}",
                if enabled { "enabled" } else { "disabled" },
                actor.name
            ),
            &actor.name,
        )
        .await;

        Ok(enabled)
    }

    async fn log_admin_event(&self, message: &str, actor: &str) {
        if let Err(e) = self
            .db
            .logs
            .append(level::WARN, category::ADMIN, message, Some(actor))
            .await
        {
            warn!(error = %e, "Failed to write admin log");
        }
    }
}

fn generate_token() -> String {
    use rand::Rng;
    let bytes: [u8; 32] = rand::thread_rng().gen();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
