//! Roblox user-directory service implementation
//!
//! Resolves usernames or numeric ids against the public Roblox user API and
//! fetches avatar thumbnails. Read-only; a missing user resolves to `None`
//! and the caller decides how to surface that.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::RobloxConfig;
use crate::utils::errors::{KosError, Result, RobloxError};

/// Resolved Roblox account: canonical id/name pair plus optional avatar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobloxProfile {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserPayload {
    id: u64,
    name: String,
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct UsernameLookupResponse {
    data: Vec<UserPayload>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UsernameLookupRequest<'a> {
    usernames: [&'a str; 1],
    exclude_banned_users: bool,
}

#[derive(Debug, Deserialize)]
struct ThumbnailResponse {
    data: Vec<ThumbnailPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThumbnailPayload {
    image_url: Option<String>,
}

/// Roblox lookup service
#[derive(Debug, Clone)]
pub struct RobloxService {
    client: Client,
    config: RobloxConfig,
}

impl RobloxService {
    /// Create a new RobloxService instance
    pub fn new(config: RobloxConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("Brotherhood-KOS/1.0")
            .build()
            .map_err(KosError::Http)?;

        Ok(Self { client, config })
    }

    /// Resolve a username or numeric user id to a profile.
    ///
    /// Returns `Ok(None)` when the upstream directory has no match; the
    /// thumbnail is best-effort and may be absent on a successful resolve.
    pub async fn resolve(&self, username_or_id: &str) -> Result<Option<RobloxProfile>> {
        let query = username_or_id.trim();
        if query.is_empty() {
            return Err(KosError::Validation("Username is required".to_string()));
        }

        let user = if query.chars().all(|c| c.is_ascii_digit()) {
            self.lookup_by_id(query).await?
        } else {
            self.lookup_by_username(query).await?
        };

        let Some(user) = user else {
            debug!(query = query, "No Roblox user matched the lookup");
            return Ok(None);
        };

        let id = user.id.to_string();
        let thumbnail_url = self.fetch_thumbnail(&id).await;

        Ok(Some(RobloxProfile {
            id,
            name: user.name,
            display_name: user.display_name,
            thumbnail_url,
        }))
    }

    async fn lookup_by_id(&self, user_id: &str) -> Result<Option<UserPayload>> {
        let url = format!("{}/v1/users/{user_id}", self.config.users_api_url);
        debug!(user_id = user_id, url = %url, "Looking up Roblox user by id");

        let response = self.client.get(&url).send().await.map_err(Self::map_send_error)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(KosError::Roblox(RobloxError::RequestFailed(format!(
                "HTTP {}",
                response.status()
            ))));
        }

        let user: UserPayload = response
            .json()
            .await
            .map_err(|e| KosError::Roblox(RobloxError::InvalidResponse(e.to_string())))?;

        Ok(Some(user))
    }

    async fn lookup_by_username(&self, username: &str) -> Result<Option<UserPayload>> {
        let url = format!("{}/v1/usernames/users", self.config.users_api_url);
        debug!(username = username, url = %url, "Looking up Roblox user by username");

        let body = UsernameLookupRequest {
            usernames: [username],
            exclude_banned_users: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        if !response.status().is_success() {
            return Err(KosError::Roblox(RobloxError::RequestFailed(format!(
                "HTTP {}",
                response.status()
            ))));
        }

        let payload: UsernameLookupResponse = response
            .json()
            .await
            .map_err(|e| KosError::Roblox(RobloxError::InvalidResponse(e.to_string())))?;

        Ok(payload.data.into_iter().next())
    }

    /// Avatar headshot URL; any failure degrades to `None`.
    async fn fetch_thumbnail(&self, user_id: &str) -> Option<String> {
        let url = format!(
            "{}/v1/users/avatar-headshot?userIds={user_id}&size=150x150&format=Png",
            self.config.thumbnails_api_url
        );

        let response = match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!(user_id = user_id, status = %response.status(), "Thumbnail fetch failed");
                return None;
            }
            Err(e) => {
                warn!(user_id = user_id, error = %e, "Thumbnail fetch failed");
                return None;
            }
        };

        match response.json::<ThumbnailResponse>().await {
            Ok(payload) => payload.data.into_iter().next().and_then(|t| t.image_url),
            Err(e) => {
                warn!(user_id = user_id, error = %e, "Invalid thumbnail response");
                None
            }
        }
    }

    fn map_send_error(e: reqwest::Error) -> KosError {
        if e.is_timeout() {
            KosError::Roblox(RobloxError::Timeout)
        } else if e.is_connect() {
            KosError::Roblox(RobloxError::ServiceUnavailable)
        } else {
            KosError::Roblox(RobloxError::RequestFailed(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_payload_deserialization() {
        let json = r#"{"id": 156, "name": "builderman", "displayName": "Builderman", "hasVerifiedBadge": true}"#;
        let user: UserPayload = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, 156);
        assert_eq!(user.name, "builderman");
        assert_eq!(user.display_name, "Builderman");
    }

    #[test]
    fn username_lookup_empty_data() {
        let json = r#"{"data": []}"#;
        let payload: UsernameLookupResponse = serde_json::from_str(json).unwrap();
        assert!(payload.data.is_empty());
    }

    #[test]
    fn thumbnail_response_missing_url() {
        let json = r#"{"data": [{"targetId": 156, "state": "Blocked", "imageUrl": null}]}"#;
        let payload: ThumbnailResponse = serde_json::from_str(json).unwrap();
        assert!(payload.data[0].image_url.is_none());
    }

    #[test]
    fn lookup_request_serialization() {
        let body = UsernameLookupRequest {
            usernames: ["builderman"],
            exclude_banned_users: false,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"usernames\":[\"builderman\"]"));
        assert!(json.contains("\"excludeBannedUsers\":false"));
    }
}
