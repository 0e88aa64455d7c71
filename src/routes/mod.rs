//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the JSON API the UI layer drives. Handlers are thin:
//! they extract, call into `services`, and map results onto status codes.

pub mod chatrooms;
pub mod preferences;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Full API router with permissive CORS and request tracing.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/api/chatrooms",
            get(chatrooms::list_chatrooms).post(chatrooms::create_chatroom),
        )
        .route(
            "/api/chatrooms/{id}",
            get(chatrooms::get_chatroom).delete(chatrooms::delete_chatroom),
        )
        .route(
            "/api/chatrooms/{id}/messages",
            get(chatrooms::list_messages).post(chatrooms::send_message),
        )
        .route("/api/chatrooms/{id}/history", get(chatrooms::load_history))
        .route("/api/chatrooms/{id}/view", get(chatrooms::load_view))
        .route("/api/chatrooms/{id}/status", get(chatrooms::chatroom_status))
        .route(
            "/api/active",
            get(chatrooms::get_active).put(chatrooms::set_active),
        )
        .route("/api/search", put(chatrooms::set_search))
        .route("/api/status", get(chatrooms::responder_status))
        .route(
            "/api/preferences",
            get(preferences::get_preferences).put(preferences::update_preferences),
        )
        .route(
            "/api/preferences/dark-mode/toggle",
            post(preferences::toggle_dark_mode),
        )
        .route(
            "/api/loading/{key}",
            get(preferences::get_loading).put(preferences::set_loading),
        )
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
