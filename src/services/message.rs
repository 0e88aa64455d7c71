//! Message service — send, append, paging, and ordering utilities.
//!
//! DESIGN
//! ======
//! Messages are only ever appended to a chatroom (user sends and AI
//! replies); history pages are returned to the caller, not stored. Every
//! append goes through [`append_message`], which keeps `last_message` on the
//! newest message and marks the chat record dirty.
//!
//! A send on a chatroom that no longer exists is a silent no-op: nothing is
//! appended and no reply is scheduled.

use std::collections::HashSet;

use tracing::info;

use crate::services::persistence::Record;
use crate::services::responder;
use crate::services::validation::{ValidationError, validate_content};
use crate::state::{AppState, Message};

/// Whether a user send should trigger a simulated AI reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyMode {
    Schedule,
    Suppress,
}

// =============================================================================
// SEND / APPEND
// =============================================================================

/// Validate and append a user message, then schedule one AI reply.
///
/// Returns `Ok(None)` when the chatroom does not exist.
///
/// # Errors
///
/// Returns a validation error for empty or oversized content.
pub async fn send_message(
    state: &AppState,
    chatroom_id: &str,
    content: &str,
    image: Option<String>,
    reply: ReplyMode,
) -> Result<Option<Message>, ValidationError> {
    let content = validate_content(content, image.is_some())?;
    let message = Message::user(content, image);

    {
        let mut chat = state.chat.write().await;
        let Some(room) = chat.chatroom_mut(chatroom_id) else {
            info!(%chatroom_id, "send ignored: chatroom not found");
            return Ok(None);
        };
        room.push_message(message.clone());
        // Same critical section as the append: a concurrent delete either
        // runs first (no reply) or cancels the registered reply.
        if reply == ReplyMode::Schedule {
            responder::schedule_reply(state, &chat, chatroom_id);
        }
    }
    state.persist.mark_dirty(Record::Chat);
    info!(%chatroom_id, message_id = %message.id, len = message.content.len(), "message sent");

    Ok(Some(message))
}

/// Append a message to a chatroom. Returns `false` if the chatroom is gone.
pub async fn append_message(state: &AppState, chatroom_id: &str, message: Message) -> bool {
    {
        let mut chat = state.chat.write().await;
        let Some(room) = chat.chatroom_mut(chatroom_id) else {
            return false;
        };
        room.push_message(message);
    }
    state.persist.mark_dirty(Record::Chat);
    true
}

/// Stored messages `[page * page_size, (page + 1) * page_size)`. Empty for
/// an unknown chatroom or a page past the end.
pub async fn chatroom_messages(state: &AppState, chatroom_id: &str, page: usize) -> Vec<Message> {
    let page_size = state.config.page_size;
    let chat = state.chat.read().await;
    let Some(room) = chat.chatroom(chatroom_id) else {
        return Vec::new();
    };
    room.messages
        .iter()
        .skip(page.saturating_mul(page_size))
        .take(page_size)
        .cloned()
        .collect()
}

// =============================================================================
// ORDERING UTILITIES
// =============================================================================

/// Keep the first occurrence of each message ID, preserving order.
#[must_use]
pub fn dedup_messages(messages: &[Message]) -> Vec<Message> {
    let mut seen = HashSet::with_capacity(messages.len());
    messages
        .iter()
        .filter(|m| seen.insert(m.id.as_str()))
        .cloned()
        .collect()
}

/// Ascending by timestamp; ties keep their input order.
#[must_use]
pub fn sort_messages_by_timestamp(messages: &[Message]) -> Vec<Message> {
    let mut sorted = messages.to_vec();
    sorted.sort_by_key(|m| m.timestamp);
    sorted
}

/// Combine an older history page with the messages a view already shows.
///
/// On an ID collision the current message wins. The result is deduplicated
/// and sorted oldest first.
#[must_use]
pub fn merge_history(current: &[Message], older: &[Message]) -> Vec<Message> {
    let current_ids: HashSet<&str> = current.iter().map(|m| m.id.as_str()).collect();
    let combined: Vec<Message> = older
        .iter()
        .filter(|m| !current_ids.contains(m.id.as_str()))
        .chain(current)
        .cloned()
        .collect();
    sort_messages_by_timestamp(&dedup_messages(&combined))
}

#[cfg(test)]
#[path = "message_test.rs"]
mod tests;
