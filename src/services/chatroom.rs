//! Chatroom service — registry CRUD, active selection, and search filter.
//!
//! DESIGN
//! ======
//! The registry lists chatrooms newest-created first. The active selection
//! is not validated on write; a dangling ID simply resolves to "not found"
//! on lookup. Deleting a chatroom aborts its pending AI replies under the
//! same write lock, so no reply can land in a deleted room.

use tracing::info;

use crate::services::persistence::Record;
use crate::services::validation::{ValidationError, validate_title};
use crate::state::{AppState, Chatroom};

// =============================================================================
// CRUD
// =============================================================================

/// Create a chatroom at the front of the listing. Returns its ID.
///
/// # Errors
///
/// Returns a validation error if the sanitized title is empty or longer
/// than 50 characters.
pub async fn create_chatroom(state: &AppState, title: &str) -> Result<String, ValidationError> {
    let title = validate_title(title)?;
    let room = Chatroom::new(title);
    let id = room.id.clone();
    {
        let mut chat = state.chat.write().await;
        chat.chatrooms.insert(0, room);
    }
    state.persist.mark_dirty(Record::Chat);
    info!(chatroom_id = %id, "chatroom created");
    Ok(id)
}

/// Delete a chatroom, abort its pending replies, and clear the active
/// selection if it pointed here. Returns `false` (a no-op) when no chatroom
/// has this ID.
pub async fn delete_chatroom(state: &AppState, id: &str) -> bool {
    let (removed, cancelled) = {
        let mut chat = state.chat.write().await;
        let before = chat.chatrooms.len();
        chat.chatrooms.retain(|room| room.id != id);
        if chat.active_chatroom.as_deref() == Some(id) {
            chat.active_chatroom = None;
        }
        (chat.chatrooms.len() < before, state.responder.cancel(id))
    };
    if !removed {
        info!(chatroom_id = %id, "delete ignored: chatroom not found");
        return false;
    }
    state.persist.mark_dirty(Record::Chat);
    info!(chatroom_id = %id, cancelled_replies = cancelled, "chatroom deleted");
    true
}

/// Look up a chatroom by ID.
pub async fn get_chatroom(state: &AppState, id: &str) -> Option<Chatroom> {
    state.chat.read().await.chatroom(id).cloned()
}

// =============================================================================
// SELECTION / FILTER
// =============================================================================

/// Set or clear the active chatroom. Existence is not checked.
pub async fn set_active_chatroom(state: &AppState, id: Option<String>) {
    state.chat.write().await.active_chatroom = id;
}

/// The active chatroom, or `None` when nothing is selected or the selection
/// dangles.
pub async fn get_active_chatroom(state: &AppState) -> Option<Chatroom> {
    let chat = state.chat.read().await;
    chat.active_chatroom
        .as_deref()
        .and_then(|id| chat.chatroom(id))
        .cloned()
}

pub async fn set_search_query(state: &AppState, query: &str) {
    state.chat.write().await.search_query = query.to_owned();
}

/// Chatrooms whose title contains the search query, case-insensitively.
/// Every chatroom when the query is empty.
pub async fn get_filtered_chatrooms(state: &AppState) -> Vec<Chatroom> {
    let chat = state.chat.read().await;
    filter_by_title(&chat.chatrooms, &chat.search_query)
}

fn filter_by_title(chatrooms: &[Chatroom], query: &str) -> Vec<Chatroom> {
    if query.is_empty() {
        return chatrooms.to_vec();
    }
    let needle = query.to_lowercase();
    chatrooms
        .iter()
        .filter(|room| room.title.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

#[cfg(test)]
#[path = "chatroom_test.rs"]
mod tests;
