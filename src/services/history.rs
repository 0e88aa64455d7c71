//! History service — older message pages for infinite scroll.
//!
//! DESIGN
//! ======
//! History pages come from a [`HistorySource`]. The shipped source,
//! [`SyntheticHistory`], fabricates placeholder messages so pagination can be
//! exercised without a backend; a real paginated fetch can replace it
//! without touching callers. Pages are returned to the caller and never
//! written into the chatroom.
//!
//! Synthetic pages obey three rules:
//! - page 0 pads the stored message count up to one page, later pages are
//!   full pages, and an empty page means "no more history";
//! - every timestamp is strictly older than the chatroom's oldest message,
//!   stepping back one interval per message;
//! - no generated ID collides with a stored message ID.

use std::collections::HashSet;
use std::time::Duration;

use rand::Rng;
use tracing::info;

use crate::config::StoreConfig;
use crate::services::preferences::{begin_messages_load, end_messages_load};
use crate::state::{AppState, Chatroom, Message, Sender, now_ms};

/// Supplier of older history pages for a chatroom.
#[async_trait::async_trait]
pub trait HistorySource: Send + Sync {
    /// Fetch page `page` of history older than what `chatroom` holds.
    async fn fetch_history_page(&self, chatroom: &Chatroom, page: u32) -> Vec<Message>;
}

// =============================================================================
// SYNTHETIC SOURCE
// =============================================================================

pub struct SyntheticHistory {
    page_size: usize,
    step_ms: i64,
    latency: Duration,
    /// Last page served; `0` means unlimited.
    max_pages: u32,
}

impl SyntheticHistory {
    #[must_use]
    pub fn from_config(config: &StoreConfig) -> Self {
        Self {
            page_size: config.page_size,
            step_ms: config.history_step_ms,
            latency: config.history_latency,
            max_pages: config.history_max_pages,
        }
    }
}

#[async_trait::async_trait]
impl HistorySource for SyntheticHistory {
    async fn fetch_history_page(&self, chatroom: &Chatroom, page: u32) -> Vec<Message> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.max_pages > 0 && page > self.max_pages {
            return Vec::new();
        }
        synthesize_page(chatroom, page, self.page_size, self.step_ms, now_ms())
    }
}

/// Build one synthetic page for `chatroom`, stamped with `generated_at`.
#[must_use]
pub fn synthesize_page(
    chatroom: &Chatroom,
    page: u32,
    page_size: usize,
    step_ms: i64,
    generated_at: i64,
) -> Vec<Message> {
    let needed = if page == 0 { page_size.saturating_sub(chatroom.messages.len()) } else { page_size };
    if needed == 0 {
        return Vec::new();
    }

    let anchor = chatroom.oldest_timestamp().unwrap_or(generated_at);
    let start_index = (page as usize).saturating_mul(page_size);
    let existing: HashSet<&str> = chatroom.messages.iter().map(|m| m.id.as_str()).collect();
    let mut rng = rand::rng();

    (0..needed)
        .map(|i| {
            let ordinal = start_index.saturating_add(i + 1);
            let offset = i64::try_from(ordinal)
                .unwrap_or(i64::MAX)
                .saturating_mul(step_ms);
            let sender = if rng.random_bool(0.5) { Sender::User } else { Sender::Ai };
            Message {
                id: unique_id(&existing, &format!("history-{page}-{i}-{generated_at}")),
                content: format!("Earlier message #{ordinal}"),
                sender,
                timestamp: anchor.saturating_sub(offset),
                image: None,
            }
        })
        .collect()
}

fn unique_id(existing: &HashSet<&str>, base: &str) -> String {
    if !existing.contains(base) {
        return base.to_owned();
    }
    (1..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !existing.contains(candidate.as_str()))
        .unwrap_or_else(|| base.to_owned())
}

// =============================================================================
// LOAD MORE
// =============================================================================

/// Load page `page` of older history for a chatroom. Empty when the
/// chatroom does not exist or history is exhausted.
pub async fn load_more_messages(state: &AppState, chatroom_id: &str, page: u32) -> Vec<Message> {
    // Snapshot the room so the lock is not held across the fetch.
    let Some(room) = state.chat.read().await.chatroom(chatroom_id).cloned() else {
        return Vec::new();
    };

    let loading = MessagesLoading::begin(state).await;
    let messages = state.history.fetch_history_page(&room, page).await;
    loading.finish().await;

    info!(%chatroom_id, page, count = messages.len(), "history page served");
    messages
}

/// Holds the `messages` loading flag for one fetch. Dropped without
/// `finish` (the request future was cancelled mid-fetch), it still releases
/// its hold from a spawned task.
struct MessagesLoading {
    state: Option<AppState>,
}

impl MessagesLoading {
    async fn begin(state: &AppState) -> Self {
        begin_messages_load(state).await;
        Self { state: Some(state.clone()) }
    }

    async fn finish(mut self) {
        if let Some(state) = self.state.take() {
            end_messages_load(&state).await;
        }
    }
}

impl Drop for MessagesLoading {
    fn drop(&mut self) {
        let Some(state) = self.state.take() else {
            return;
        };
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                end_messages_load(&state).await;
            });
        }
    }
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
