//! REST API error mapping
//!
//! Maps the application error taxonomy onto HTTP statuses. Server-side
//! failures log their detail here and return a generic body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::utils::errors::KosError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// Wrapper giving `KosError` an HTTP rendering.
#[derive(Debug)]
pub struct ApiError(pub KosError);

impl From<KosError> for ApiError {
    fn from(error: KosError) -> Self {
        Self(error)
    }
}

/// Taxonomy → status mapping.
pub fn status_for(error: &KosError) -> StatusCode {
    match error {
        KosError::Validation(_) => StatusCode::BAD_REQUEST,
        KosError::Auth => StatusCode::UNAUTHORIZED,
        KosError::NotFound(_) => StatusCode::NOT_FOUND,
        KosError::Conflict(_) => StatusCode::CONFLICT,
        KosError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        KosError::Roblox(_) | KosError::Http(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn label_for(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        409 => "Conflict",
        429 => "Too Many Requests",
        502 => "Bad Gateway",
        _ => "Internal Server Error",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);

        let message = if status.is_server_error() {
            // Detail stays server-side.
            error!(error = %self.0, "API request failed");
            "An internal error occurred".to_string()
        } else if status == StatusCode::BAD_GATEWAY {
            "Upstream service unavailable".to_string()
        } else {
            self.0.to_string()
        };

        let body = ErrorBody {
            error: label_for(status),
            message,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::errors::RobloxError;

    #[test]
    fn taxonomy_maps_to_expected_statuses() {
        assert_eq!(
            status_for(&KosError::Validation("bad".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&KosError::NotFound("missing".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&KosError::Conflict("dup".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(status_for(&KosError::Auth), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_for(&KosError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            status_for(&KosError::Roblox(RobloxError::Timeout)),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&KosError::Database(sqlx::Error::RowNotFound)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn server_errors_hide_detail() {
        let response = ApiError(KosError::Database(sqlx::Error::PoolClosed)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn auth_response_has_no_detail() {
        let response = ApiError(KosError::Auth).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
