//! jotter-api - HTTP API server for jotter
//!
//! The binary in `main.rs` loads configuration, builds the services and
//! serves [`router`]. Everything else lives here so it can be exercised
//! without a listening socket.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod state;
pub mod telemetry;

use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use jotter_core::defaults::{CORS_MAX_AGE_SECS, MAX_BODY_SIZE_BYTES};

pub use auth::RequireUser;
pub use error::ApiError;
pub use state::AppState;

use handlers::{ai, api_keys, auth as auth_handlers, health, labels, logs, notes};

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// RATE LIMITING
// =============================================================================

async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(limiter) = &state.rate_limiter {
        if limiter.check().is_err() {
            tracing::warn!(subsystem = "api", "Rate limit exceeded");
            return Err(ApiError::TooManyRequests(
                "too many requests, please wait before retrying".to_string(),
            ));
        }
    }
    Ok(next.run(request).await)
}

// =============================================================================
// ROUTER
// =============================================================================

/// Build the application router with its middleware stack.
pub fn router(state: AppState, allowed_origins: Vec<HeaderValue>) -> Router {
    let api = Router::new()
        // Auth
        .route("/auth/register", post(auth_handlers::register))
        .route("/auth/login", post(auth_handlers::login))
        .route("/auth/me", get(auth_handlers::me))
        // Notes
        .route("/notes", get(notes::list_notes).post(notes::create_note))
        .route(
            "/notes/:id",
            get(notes::get_note)
                .put(notes::update_note)
                .delete(notes::delete_note),
        )
        // Tags
        .route("/tags", get(labels::list_tags).post(labels::create_tag))
        .route(
            "/tags/:id",
            get(labels::get_tag)
                .put(labels::rename_tag)
                .delete(labels::delete_tag),
        )
        // Categories
        .route(
            "/categories",
            get(labels::list_categories).post(labels::create_category),
        )
        .route(
            "/categories/:id",
            get(labels::get_category)
                .put(labels::rename_category)
                .delete(labels::delete_category),
        )
        // Provider keys
        .route(
            "/api-keys",
            get(api_keys::list_keys).post(api_keys::create_key),
        )
        .route(
            "/api-keys/:id",
            get(api_keys::get_key)
                .put(api_keys::update_key)
                .delete(api_keys::delete_key),
        )
        // AI audit log
        .route(
            "/logs",
            get(logs::list_logs)
                .post(logs::create_log)
                .delete(logs::clear_logs),
        )
        .route("/logs/:id", get(logs::get_log).delete(logs::delete_log))
        // AI processing (SSE)
        .route("/ai/process", post(ai::process_text));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v1", api)
        .fallback(not_found)
        // Middleware
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .allow_credentials(true)
                .max_age(Duration::from_secs(CORS_MAX_AGE_SECS)),
        )
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE_BYTES))
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::NotFound("route not found".to_string())
}
