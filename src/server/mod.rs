//! Axum HTTP API — the consultation service's only external surface.
//!
//! ## URL layout
//!
//! ```text
//! POST /users/register
//! POST /users/login
//! GET  /users/{user_id}
//! POST /chat/message
//! GET  /chat/history/{user_id}
//! GET  /health
//! ```
//!
//! [`run`] drives the axum event loop; a [`CancellationToken`] is wired to
//! axum's graceful shutdown so Ctrl-C drains in-flight requests.

mod api;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::advisor::ResponseEngine;
use crate::core::error::AppError;
use crate::storage::Store;

// ── Shared request state ──────────────────────────────────────────────────────

/// Router state injected into every handler via [`axum::extract::State`].
///
/// Cheap to clone — all fields are reference-counted.
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<Store>,
    pub engine: Arc<ResponseEngine>,
    /// Location assumed when a client registers without one.
    pub default_location: Arc<str>,
}

impl ApiState {
    pub fn new(store: Arc<Store>, engine: Arc<ResponseEngine>, default_location: &str) -> Self {
        Self {
            store,
            engine,
            default_location: Arc::from(default_location),
        }
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

/// Build the application router. `cors_any_origin` attaches a permissive
/// CORS layer for browser frontends served from another origin.
pub fn build_router(state: ApiState, cors_any_origin: bool) -> Router {
    let router = Router::new()
        .route("/users/register", post(api::register))
        .route("/users/login", post(api::login))
        .route("/users/{user_id}", get(api::user_profile))
        .route("/chat/message", post(api::chat_message))
        .route("/chat/history/{user_id}", get(api::chat_history))
        .route("/health", get(api::health))
        .with_state(state);

    if cors_any_origin {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    }
}

// ── Server loop ───────────────────────────────────────────────────────────────

/// Bind `bind_addr` and serve `router` until `shutdown` is cancelled.
pub async fn run(
    bind_addr: &str,
    router: Router,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .map_err(|e| AppError::Server(format!("bind failed on {bind_addr}: {e}")))?;

    info!(%bind_addr, "http api listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Server(format!("server error: {e}")))?;

    info!("http api shut down");
    Ok(())
}
