//! REST API route handlers
//!
//! Each handler extracts validated input, invokes exactly one service
//! operation, and maps the result into the response envelope. Business
//! rules live in the services.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::error::ApiError;
use crate::api::ApiState;
use crate::models::{Actor, ListFilter};
use crate::utils::duration::parse_duration;
use crate::utils::errors::KosError;

/// Default page size for listings.
const DEFAULT_PAGE_LIMIT: i64 = 25;

/// Raw bearer token carried alongside the verified actor.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub code: String,
}

// POST /api/auth/login
pub async fn login(
    State(state): State<ApiState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    // One shared budget for anonymous login attempts.
    state.limiter.check("anonymous:login")?;

    let session = state.services.auth.login(&body.code).await?;

    Ok(Json(json!({
        "success": true,
        "token": session.token,
        "expires_at": session.expires_at,
    })))
}

// POST /api/auth/logout
pub async fn logout(
    State(state): State<ApiState>,
    Extension(token): Extension<BearerToken>,
) -> Result<Json<Value>, ApiError> {
    state.services.auth.logout(&token.0).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Logged out successfully",
    })))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub filter: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

// GET /api/kos
pub async fn list_entries(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let filter = match query.filter.as_deref() {
        Some(raw) => ListFilter::parse(raw)?,
        None => ListFilter::Active,
    };

    let page = state
        .services
        .kos
        .list(
            filter,
            query.page.unwrap_or(1),
            query.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "entries": page.items,
        "pagination": {
            "page": page.page,
            "limit": page.limit,
            "total": page.total,
            "total_pages": page.total_pages,
        },
    })))
}

// GET /api/kos/:id
pub async fn get_entry(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let roblox_user_id = validate_roblox_id(&id)?;

    let Some(entry) = state.services.kos.find(roblox_user_id).await? else {
        return Err(KosError::NotFound("KOS entry not found".to_string()).into());
    };

    Ok(Json(json!({ "success": true, "entry": entry })))
}

#[derive(Debug, Deserialize)]
pub struct CreateKosRequest {
    pub username: String,
    pub reason: String,
    pub duration: Option<String>,
    #[serde(default)]
    pub permanent: bool,
}

// POST /api/kos
pub async fn create_entry(
    State(state): State<ApiState>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<CreateKosRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let expires_at = match body.duration.as_deref() {
        Some(raw) => Some(Utc::now() + parse_duration(raw)?),
        None => None,
    };

    let Some(profile) = state.services.roblox.resolve(&body.username).await? else {
        return Err(KosError::NotFound(format!(
            "Could not find Roblox user: {}",
            body.username
        ))
        .into());
    };

    let entry = state
        .services
        .kos
        .add(&profile, &body.reason, &actor, expires_at, body.permanent)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "KOS entry added successfully",
            "entry": entry,
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub reason: Option<String>,
}

// DELETE /api/kos/:id
pub async fn delete_entry(
    State(state): State<ApiState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<Value>, ApiError> {
    let roblox_user_id = validate_roblox_id(&id)?;
    let reason = query
        .reason
        .unwrap_or_else(|| "Removed from KOS".to_string());

    let entry = state
        .services
        .kos
        .remove(roblox_user_id, &reason, &actor)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "KOS entry removed successfully",
        "entry": entry,
    })))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

// GET /api/history
pub async fn history(
    State(state): State<ApiState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Value>, ApiError> {
    let page = state
        .services
        .kos
        .history(
            query.page.unwrap_or(1),
            query.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "history": page.items,
        "pagination": {
            "page": page.page,
            "limit": page.limit,
            "total": page.total,
            "total_pages": page.total_pages,
        },
    })))
}

// GET /api/stats
pub async fn stats(State(state): State<ApiState>) -> Result<Json<Value>, ApiError> {
    let stats = state.services.kos.stats().await?;
    let enabled = state.services.admin.is_enabled().await?;

    Ok(Json(json!({
        "success": true,
        "statistics": stats,
        "bot_status": { "enabled": enabled },
    })))
}

// GET /api/status
pub async fn status(Extension(actor): Extension<Actor>) -> Json<Value> {
    Json(json!({
        "success": true,
        "user": actor,
        "timestamp": Utc::now(),
    }))
}

fn validate_roblox_id(id: &str) -> Result<&str, ApiError> {
    let id = id.trim();
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return Err(KosError::Validation(
            "Roblox user id must be numeric".to_string(),
        )
        .into());
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert(header::AUTHORIZATION, "Token abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.remove(header::AUTHORIZATION);
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn roblox_id_validation() {
        assert!(validate_roblox_id("123456").is_ok());
        assert!(validate_roblox_id("builderman").is_err());
        assert!(validate_roblox_id("").is_err());
        assert!(validate_roblox_id("12 34").is_err());
    }
}
