//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is the one explicit store object of the process. It is built
//! once at startup (rehydrated from durable storage), cloned into the axum
//! router and the background tasks, and torn down on shutdown. Every field
//! is `Arc`-wrapped or `Clone`, so clones share the same store.
//!
//! All chat mutations take the `chat` write lock, which serializes them and
//! keeps per-chatroom append order equal to completion order.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::services::history::{HistorySource, SyntheticHistory};
use crate::services::persistence::{PersistTracker, Storage};
use crate::services::preferences::UiState;
use crate::services::responder::Responder;

/// Current time as milliseconds since Unix epoch.
pub(crate) fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

// =============================================================================
// MESSAGE
// =============================================================================

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

/// One turn in a chatroom. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub sender: Sender,
    /// Milliseconds since Unix epoch.
    pub timestamp: i64,
    /// Opaque encoded image payload (typically a data URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Message {
    #[must_use]
    pub fn user(content: impl Into<String>, image: Option<String>) -> Self {
        Self { id: Uuid::new_v4().to_string(), content: content.into(), sender: Sender::User, timestamp: now_ms(), image }
    }

    #[must_use]
    pub fn ai(content: impl Into<String>) -> Self {
        Self { id: Uuid::new_v4().to_string(), content: content.into(), sender: Sender::Ai, timestamp: now_ms(), image: None }
    }
}

// =============================================================================
// CHATROOM
// =============================================================================

/// A named container of an ordered message history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chatroom {
    pub id: String,
    pub title: String,
    pub created_at: i64,
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Denormalized newest message, for list display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<Message>,
}

impl Chatroom {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            created_at: now_ms(),
            messages: Vec::new(),
            last_message: None,
        }
    }

    /// Append a message and keep `last_message` on the newest one.
    pub fn push_message(&mut self, message: Message) {
        let newer = self
            .last_message
            .as_ref()
            .is_none_or(|last| message.timestamp >= last.timestamp);
        if newer {
            self.last_message = Some(message.clone());
        }
        self.messages.push(message);
    }

    /// Recompute `last_message` from `messages`. Ties go to the later entry.
    pub fn refresh_last_message(&mut self) {
        self.last_message = self
            .messages
            .iter()
            .max_by_key(|m| m.timestamp)
            .cloned();
    }

    /// Timestamp of the chronologically oldest stored message.
    #[must_use]
    pub fn oldest_timestamp(&self) -> Option<i64> {
        self.messages.iter().map(|m| m.timestamp).min()
    }
}

// =============================================================================
// CHAT STATE
// =============================================================================

/// Registry state: chatrooms newest-created first, active selection, filter.
#[derive(Debug, Clone, Default)]
pub struct ChatState {
    pub chatrooms: Vec<Chatroom>,
    /// May dangle; lookups treat a dangling id as "not found".
    pub active_chatroom: Option<String>,
    pub search_query: String,
}

impl ChatState {
    /// Build registry state from persisted chatrooms.
    #[must_use]
    pub fn from_chatrooms(mut chatrooms: Vec<Chatroom>) -> Self {
        for room in &mut chatrooms {
            room.refresh_last_message();
        }
        Self { chatrooms, active_chatroom: None, search_query: String::new() }
    }

    #[must_use]
    pub fn chatroom(&self, id: &str) -> Option<&Chatroom> {
        self.chatrooms.iter().find(|room| room.id == id)
    }

    pub fn chatroom_mut(&mut self, id: &str) -> Option<&mut Chatroom> {
        self.chatrooms.iter_mut().find(|room| room.id == id)
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// The process-wide store, passed by reference (or clone) to every consumer.
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<RwLock<ChatState>>,
    pub ui: Arc<RwLock<UiState>>,
    /// Pending AI replies and per-chatroom responding status.
    pub responder: Responder,
    /// Source of older history pages.
    pub history: Arc<dyn HistorySource>,
    pub storage: Storage,
    /// Dirty generations + wakeup for the persistence worker.
    pub persist: PersistTracker,
    pub config: Arc<StoreConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(config: StoreConfig, chat: ChatState, ui: UiState) -> Self {
        let history: Arc<dyn HistorySource> = Arc::new(SyntheticHistory::from_config(&config));
        Self {
            chat: Arc::new(RwLock::new(chat)),
            ui: Arc::new(RwLock::new(ui)),
            responder: Responder::new(),
            history,
            storage: Storage::new(config.data_dir.clone()),
            persist: PersistTracker::new(),
            config: Arc::new(config),
        }
    }

    /// Swap the history source (e.g. for a real backend fetch).
    #[cfg(test)]
    #[must_use]
    pub fn with_history(mut self, history: Arc<dyn HistorySource>) -> Self {
        self.history = history;
        self
    }

    /// Open the store: rehydrate both durable records, falling back to
    /// empty defaults when they are absent or corrupt.
    pub async fn open(config: StoreConfig) -> Self {
        let storage = Storage::new(config.data_dir.clone());
        let (chat, ui) = crate::services::persistence::load_state(&storage).await;
        tracing::info!(
            chatrooms = chat.chatrooms.len(),
            dark_mode = ui.dark_mode,
            data_dir = %config.data_dir.display(),
            "chat store opened"
        );
        Self::new(config, chat, ui)
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
