//! Axum handlers for the consultation API.
//!
//! Each handler receives [`ApiState`] via [`axum::extract::State`] and
//! returns an axum [`Response`]. Error bodies share one JSON shape:
//! `{"error": <code>, "message": <detail>}`.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::advisor::UserContext;
use crate::auth;
use crate::storage::{DEFAULT_CONVERSATION_TITLE, Role, StorageError, User};

use super::ApiState;

/// Messages returned by `GET /chat/history/{user_id}`.
const HISTORY_LIMIT: usize = 50;

// ── Request types ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RegisterRequest {
    username: String,
    password: String,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    age: Option<u32>,
    #[serde(default)]
    location: Option<String>,
}

#[derive(Deserialize)]
pub(super) struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Deserialize)]
pub(super) struct ChatRequest {
    user_id: i64,
    message: String,
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Build a JSON error response body.
fn json_error(code: &str, msg: impl std::fmt::Display) -> Json<serde_json::Value> {
    Json(json!({ "error": code, "message": format!("{msg}") }))
}

fn login_body(user: &User, message: &str) -> Json<serde_json::Value> {
    Json(json!({
        "user_id": user.id,
        "username": user.username,
        "message": message,
    }))
}

fn context_for(user: &User, default_location: &str) -> UserContext {
    let location = if user.location.trim().is_empty() {
        default_location.to_string()
    } else {
        user.location.clone()
    };
    UserContext {
        full_name: user.full_name.clone(),
        age: user.age,
        location,
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// POST /users/register
pub(super) async fn register(
    State(state): State<ApiState>,
    Json(req): Json<RegisterRequest>,
) -> Response {
    let registration = auth::Registration {
        username: req.username,
        password: req.password,
        full_name: req.full_name,
        age: req.age,
        location: req
            .location
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| state.default_location.to_string()),
    };

    match auth::create_user(&state.store, registration) {
        Ok(user) => {
            (StatusCode::OK, login_body(&user, "User registered successfully")).into_response()
        }
        Err(e @ StorageError::DuplicateUsername(_)) => {
            (StatusCode::BAD_REQUEST, json_error("duplicate_username", e)).into_response()
        }
        Err(e) => {
            warn!(error = %e, "registration failed");
            (StatusCode::INTERNAL_SERVER_ERROR, json_error("internal", e)).into_response()
        }
    }
}

/// POST /users/login
pub(super) async fn login(
    State(state): State<ApiState>,
    Json(req): Json<LoginRequest>,
) -> Response {
    match auth::authenticate(&state.store, &req.username, &req.password) {
        Ok(Some(user)) => (StatusCode::OK, login_body(&user, "Login successful")).into_response(),
        Ok(None) => (
            StatusCode::UNAUTHORIZED,
            json_error("invalid_credentials", "invalid username or password"),
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "login failed");
            (StatusCode::INTERNAL_SERVER_ERROR, json_error("internal", e)).into_response()
        }
    }
}

/// GET /users/{user_id}
pub(super) async fn user_profile(
    State(state): State<ApiState>,
    Path(user_id): Path<i64>,
) -> Response {
    match state.store.user_by_id(user_id) {
        Ok(Some(user)) => (
            StatusCode::OK,
            Json(json!({
                "id": user.id,
                "username": user.username,
                "full_name": user.full_name,
                "age": user.age,
                "location": user.location,
            })),
        )
            .into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, json_error("not_found", "user not found"))
            .into_response(),
        Err(e) => {
            warn!(%user_id, error = %e, "profile lookup failed");
            (StatusCode::INTERNAL_SERVER_ERROR, json_error("internal", e)).into_response()
        }
    }
}

/// POST /chat/message
///
/// Looks up the user, asks the response engine for a reply, and records both
/// sides of the exchange in the user's most recent conversation (opening one
/// when none exists). A persistence failure is logged but does not withhold
/// the reply — the advice was already produced.
pub(super) async fn chat_message(
    State(state): State<ApiState>,
    Json(req): Json<ChatRequest>,
) -> Response {
    let user = match state.store.user_by_id(req.user_id) {
        Ok(Some(user)) => user,
        Ok(None) => {
            return (StatusCode::NOT_FOUND, json_error("not_found", "user not found"))
                .into_response();
        }
        Err(e) => {
            warn!(user_id = req.user_id, error = %e, "chat user lookup failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, json_error("internal", e))
                .into_response();
        }
    };

    let ctx = context_for(&user, &state.default_location);
    let reply = state.engine.respond(&req.message, &ctx).await;

    if let Err(e) = record_exchange(&state, user.id, &req.message, &reply) {
        warn!(user_id = user.id, error = %e, "failed to persist chat exchange");
    }

    (StatusCode::OK, Json(json!({ "response": reply }))).into_response()
}

fn record_exchange(
    state: &ApiState,
    user_id: i64,
    message: &str,
    reply: &str,
) -> Result<(), StorageError> {
    let conversation_id = match state.store.latest_conversation(user_id)? {
        Some(id) => id,
        None => state
            .store
            .create_conversation(user_id, DEFAULT_CONVERSATION_TITLE)?,
    };
    state
        .store
        .append_message(conversation_id, user_id, Role::User, message)?;
    state
        .store
        .append_message(conversation_id, user_id, Role::Assistant, reply)?;
    Ok(())
}

/// GET /chat/history/{user_id}
pub(super) async fn chat_history(
    State(state): State<ApiState>,
    Path(user_id): Path<i64>,
) -> Response {
    match state.store.user_by_id(user_id) {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (StatusCode::NOT_FOUND, json_error("not_found", "user not found"))
                .into_response();
        }
        Err(e) => {
            warn!(%user_id, error = %e, "history user lookup failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, json_error("internal", e))
                .into_response();
        }
    }

    match state.store.recent_messages(user_id, HISTORY_LIMIT) {
        Ok(messages) => {
            let items: Vec<serde_json::Value> = messages
                .iter()
                .map(|m| {
                    json!({
                        "id": m.id,
                        "role": m.role,
                        "content": m.content,
                        "timestamp": m.timestamp,
                    })
                })
                .collect();
            (StatusCode::OK, Json(json!({ "messages": items }))).into_response()
        }
        Err(e) => {
            warn!(%user_id, error = %e, "history query failed");
            (StatusCode::INTERNAL_SERVER_ERROR, json_error("internal", e)).into_response()
        }
    }
}

/// GET /health
pub(super) async fn health(State(state): State<ApiState>) -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "message": "umoyo API is running",
            "remote_provider": state.engine.remote_enabled(),
        })),
    )
        .into_response()
}
