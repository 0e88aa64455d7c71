//! Chatroom, message, and responder-status routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};

use crate::services::validation::ValidationError;
use crate::services::{chatroom, history, message};
use crate::state::{AppState, Chatroom, Message};

// =============================================================================
// DTOs
// =============================================================================

/// Sidebar row: everything but the message list.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatroomSummary {
    pub id: String,
    pub title: String,
    pub created_at: i64,
    pub last_message: Option<Message>,
    pub message_count: usize,
}

fn to_summary(room: Chatroom) -> ChatroomSummary {
    ChatroomSummary {
        message_count: room.messages.len(),
        id: room.id,
        title: room.title,
        created_at: room.created_at,
        last_message: room.last_message,
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub field: String,
    pub message: String,
}

pub(crate) fn validation_error_response(err: &ValidationError) -> Response {
    let body = ErrorBody {
        code: err.error_code().to_owned(),
        field: err.field().to_owned(),
        message: err.to_string(),
    };
    (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
}

#[derive(Deserialize)]
pub struct CreateChatroomBody {
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: String,
}

#[derive(Deserialize)]
pub struct SendMessageBody {
    #[serde(default)]
    pub content: String,
    pub image: Option<String>,
    /// Skip the simulated AI reply for this send.
    #[serde(default)]
    pub no_reply: bool,
}

#[derive(Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: u32,
}

#[derive(Deserialize)]
pub struct ViewQuery {
    #[serde(default)]
    pub pages: u32,
}

#[derive(Deserialize)]
pub struct SetActiveBody {
    pub id: Option<String>,
}

#[derive(Deserialize)]
pub struct SearchBody {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub is_responding: bool,
    pub responding: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatroomStatusResponse {
    pub is_responding: bool,
    pub pending_replies: usize,
}

// =============================================================================
// REGISTRY
// =============================================================================

/// `GET /api/chatrooms` — chatrooms matching the current search query.
pub async fn list_chatrooms(State(state): State<AppState>) -> Json<Vec<ChatroomSummary>> {
    let rooms = chatroom::get_filtered_chatrooms(&state).await;
    Json(rooms.into_iter().map(to_summary).collect())
}

/// `POST /api/chatrooms` — create a chatroom.
pub async fn create_chatroom(
    State(state): State<AppState>,
    Json(body): Json<CreateChatroomBody>,
) -> Result<(StatusCode, Json<CreatedResponse>), Response> {
    let id = chatroom::create_chatroom(&state, &body.title)
        .await
        .map_err(|e| validation_error_response(&e))?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// `GET /api/chatrooms/:id` — one chatroom with its stored messages.
pub async fn get_chatroom(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Chatroom>, StatusCode> {
    chatroom::get_chatroom(&state, &id)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// `DELETE /api/chatrooms/:id` — delete a chatroom and drop its pending replies.
pub async fn delete_chatroom(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    if chatroom::delete_chatroom(&state, &id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// `GET /api/active` — the active chatroom, or `null`.
pub async fn get_active(State(state): State<AppState>) -> Json<Option<Chatroom>> {
    Json(chatroom::get_active_chatroom(&state).await)
}

/// `PUT /api/active` — set or clear the active chatroom.
pub async fn set_active(State(state): State<AppState>, Json(body): Json<SetActiveBody>) -> StatusCode {
    chatroom::set_active_chatroom(&state, body.id).await;
    StatusCode::NO_CONTENT
}

/// `PUT /api/search` — set the registry filter.
pub async fn set_search(State(state): State<AppState>, Json(body): Json<SearchBody>) -> StatusCode {
    chatroom::set_search_query(&state, &body.query).await;
    StatusCode::NO_CONTENT
}

// =============================================================================
// MESSAGES
// =============================================================================

/// `GET /api/chatrooms/:id/messages?page=` — a page of stored messages.
pub async fn list_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Json<Vec<Message>> {
    Json(message::chatroom_messages(&state, &id, query.page as usize).await)
}

/// `POST /api/chatrooms/:id/messages` — send a user message. The AI reply
/// arrives later, so this answers 202.
pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SendMessageBody>,
) -> Result<(StatusCode, Json<Message>), Response> {
    let reply = if body.no_reply { message::ReplyMode::Suppress } else { message::ReplyMode::Schedule };
    let sent = message::send_message(&state, &id, &body.content, body.image, reply)
        .await
        .map_err(|e| validation_error_response(&e))?
        .ok_or_else(|| StatusCode::NOT_FOUND.into_response())?;
    Ok((StatusCode::ACCEPTED, Json(sent)))
}

/// `GET /api/chatrooms/:id/history?page=` — a page of older synthetic history.
pub async fn load_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Json<Vec<Message>> {
    Json(history::load_more_messages(&state, &id, query.page).await)
}

/// `GET /api/chatrooms/:id/view?pages=` — stored messages merged with the
/// first `pages` history pages, oldest first. What an infinite-scroll view
/// shows after scrolling back that far. `pages` above the configured
/// `max_view_pages` is rejected with 400.
pub async fn load_view(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<Vec<Message>>, StatusCode> {
    if query.pages > state.config.max_view_pages {
        return Err(StatusCode::BAD_REQUEST);
    }
    let room = chatroom::get_chatroom(&state, &id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    let mut older = Vec::new();
    for page in 0..query.pages {
        let batch = history::load_more_messages(&state, &id, page).await;
        // Page 0 is legitimately empty for a room that already fills a page.
        if batch.is_empty() && page > 0 {
            break;
        }
        older.extend(batch);
    }
    Ok(Json(message::merge_history(&room.messages, &older)))
}

/// `GET /api/status` — simulated responder activity.
pub async fn responder_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        is_responding: state.responder.any_responding(),
        responding: state.responder.responding_chatrooms(),
    })
}

/// `GET /api/chatrooms/:id/status` — responder activity for one chatroom.
pub async fn chatroom_status(State(state): State<AppState>, Path(id): Path<String>) -> Json<ChatroomStatusResponse> {
    Json(ChatroomStatusResponse {
        is_responding: state.responder.is_responding(&id),
        pending_replies: state.responder.pending_count(&id),
    })
}

#[cfg(test)]
#[path = "chatrooms_test.rs"]
mod tests;
