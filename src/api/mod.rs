//! REST API for the KOS list
//!
//! Axum router served from a background task. All /api routes except login
//! require a bearer session token; verified requests carry the actor in a
//! request extension.

pub mod error;
pub mod routes;

use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;

use crate::api::error::ApiError;
use crate::api::routes::BearerToken;
use crate::middleware::RateLimiter;
use crate::services::ServiceFactory;
use crate::utils::errors::KosError;

#[derive(Clone)]
pub struct ApiState {
    pub services: ServiceFactory,
    pub limiter: RateLimiter,
}

impl ApiState {
    pub fn new(services: ServiceFactory, limiter: RateLimiter) -> Self {
        Self { services, limiter }
    }
}

/// Session guard for the protected routes.
async fn require_session(
    State(state): State<ApiState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = routes::bearer_token(request.headers())
        .ok_or(KosError::Auth)?
        .to_string();

    let actor = state.services.auth.verify_session(&token).await?;
    state.limiter.check(&actor.id)?;

    request.extensions_mut().insert(actor);
    request.extensions_mut().insert(BearerToken(token));

    Ok(next.run(request).await)
}

/// Build the API router.
pub fn router(state: ApiState) -> Router {
    let protected = Router::new()
        .route("/api/kos", get(routes::list_entries).post(routes::create_entry))
        .route(
            "/api/kos/:id",
            get(routes::get_entry).delete(routes::delete_entry),
        )
        .route("/api/history", get(routes::history))
        .route("/api/stats", get(routes::stats))
        .route("/api/status", get(routes::status))
        .route("/api/auth/logout", post(routes::logout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/auth/login", post(routes::login))
        .merge(protected)
        .with_state(state)
}

/// Run the HTTP server for the REST API.
///
/// Long-running; spawn it in the background next to the bot dispatcher.
pub async fn serve(state: ApiState, bind_addr: String) {
    let app = router(state);

    let addr: std::net::SocketAddr = match bind_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!("Invalid API bind address {}: {}", bind_addr, e);
            return;
        }
    };

    tracing::info!("KOS API server listening on {}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind API server on {}: {}", addr, e);
            return;
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("API server error: {}", e);
    }
}
