//! API authentication service
//!
//! One-time auth codes handed out in chat, exchanged at login for bearer
//! session tokens. Codes and tokens are stored as keyed hashes; a sweep
//! drops expired rows. Every verification failure surfaces as the same
//! `Auth` error.

use chrono::{Duration, Utc};
use rand::Rng;
use tracing::{debug, info};

use crate::database::Database;
use crate::models::auth::session_kind;
use crate::models::log::{category, level};
use crate::models::{Actor, IssuedCode, IssuedSession};
use crate::security::signing;
use crate::utils::errors::{KosError, Result};

#[derive(Clone)]
pub struct AuthService {
    db: Database,
    secret: String,
    code_ttl: Duration,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(db: Database, secret: String, code_ttl_minutes: i64, session_ttl_hours: i64) -> Self {
        Self {
            db,
            secret,
            code_ttl: Duration::minutes(code_ttl_minutes),
            session_ttl: Duration::hours(session_ttl_hours),
        }
    }

    /// Issue a one-time login code for an actor.
    pub async fn create_auth_code(&self, actor: &Actor) -> Result<IssuedCode> {
        let code = generate_code();
        let expires_at = Utc::now() + self.code_ttl;

        self.db
            .auth
            .insert_code(&self.mac(&code), &actor.id, &actor.name, expires_at)
            .await?;

        info!(actor = %actor.name, "API auth code created");
        self.log_auth_event(&format!("API auth code created for {}", actor.name))
            .await;

        Ok(IssuedCode { code, expires_at })
    }

    /// Exchange a one-time code for a bearer session token.
    pub async fn login(&self, code: &str) -> Result<IssuedSession> {
        let normalized = code.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(KosError::Validation("Code is required".to_string()));
        }

        let now = Utc::now();
        let Some(consumed) = self.db.auth.consume_code(&self.mac(&normalized), now).await? else {
            debug!("Auth code rejected");
            return Err(KosError::Auth);
        };

        let token = generate_token();
        let expires_at = now + self.session_ttl;
        self.db
            .auth
            .insert_session(
                &self.mac(&token),
                &consumed.actor_id,
                &consumed.actor_name,
                session_kind::API,
                expires_at,
            )
            .await?;

        info!(actor = %consumed.actor_name, "API session created");
        self.log_auth_event(&format!("API session created for {}", consumed.actor_name))
            .await;

        Ok(IssuedSession { token, expires_at })
    }

    /// Verify a bearer token; fails closed with `Auth` on unknown or
    /// expired sessions. Succeeds right up to the expiry instant.
    pub async fn verify_session(&self, token: &str) -> Result<Actor> {
        let Some(session) = self
            .db
            .auth
            .find_session(&self.mac(token), session_kind::API)
            .await?
        else {
            return Err(KosError::Auth);
        };

        let now = Utc::now();
        if session.expires_at <= now {
            return Err(KosError::Auth);
        }

        // Best-effort last-used stamp.
        if let Err(e) = self.db.auth.touch_session(session.id, now).await {
            debug!(error = %e, "Failed to update session last_used_at");
        }

        Ok(Actor::new(session.actor_id, session.actor_name))
    }

    /// Invalidate a session token. Unknown tokens are a no-op.
    pub async fn logout(&self, token: &str) -> Result<()> {
        if self.db.auth.delete_session(&self.mac(token)).await? {
            info!("API session revoked");
        }
        Ok(())
    }

    /// Drop expired codes and sessions; safe to re-run on every tick.
    pub async fn sweep_expired(&self) -> Result<(u64, u64)> {
        let (codes, sessions) = self.db.auth.sweep_expired(Utc::now()).await?;
        if codes > 0 || sessions > 0 {
            info!(codes = codes, sessions = sessions, "Cleaned up expired auth data");
        }
        Ok((codes, sessions))
    }

    fn mac(&self, value: &str) -> String {
        signing::sign(value.as_bytes(), &self.secret)
    }

    async fn log_auth_event(&self, message: &str) {
        if let Err(e) = self
            .db
            .logs
            .append(level::INFO, category::AUTH, message, None)
            .await
        {
            debug!(error = %e, "Failed to write auth log");
        }
    }
}

/// 8-character uppercase hex code.
fn generate_code() -> String {
    let bytes: [u8; 4] = rand::thread_rng().gen();
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

/// 64-character hex session token.
fn generate_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_shape() {
        let code = generate_code();
        assert_eq!(code.len(), 8);
        assert!(code.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(code, code.to_uppercase());
    }

    #[test]
    fn token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(generate_token(), generate_token());
        assert_ne!(generate_code(), generate_code());
    }
}
