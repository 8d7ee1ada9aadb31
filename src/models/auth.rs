//! Auth code and session models
//!
//! Both tables hold only the keyed hash (`*_mac`) of the credential; the
//! plaintext is returned to the caller exactly once at issue time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Session kinds sharing the `api_sessions` table.
pub mod session_kind {
    /// Bearer sessions for the REST API.
    pub const API: &str = "api";
    /// Short-lived admin-panel sessions.
    pub const ADMIN: &str = "admin";
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuthCode {
    pub id: i64,
    pub code_mac: String,
    pub actor_id: String,
    pub actor_name: String,
    pub is_used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApiSession {
    pub id: i64,
    pub token_mac: String,
    pub actor_id: String,
    pub actor_name: String,
    pub kind: String,
    pub expires_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A freshly issued one-time code, plaintext included.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedCode {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// A freshly minted session token, plaintext included.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}
