//! Simulated AI responder — cancellable, per-chatroom reply tasks.
//!
//! DESIGN
//! ======
//! Each user send schedules one reply task. The task waits the configured
//! reply delay, enters the "thinking" phase (the chatroom reports as
//! responding), waits a randomized thinking time, then appends one canned
//! reply as an AI message.
//!
//! Pending tasks are kept in a side-table keyed by chatroom ID so deleting a
//! chatroom aborts its replies. Responding status is tracked per chatroom;
//! `any_responding` gives the single global view.
//!
//! TRADE-OFFS
//! ==========
//! The side-table uses a std `Mutex` that is never held across an await.
//! A task only enters the thinking phase while its ticket is still pending,
//! so a cancel that lands between the two sleeps cannot leave a stale
//! responding entry behind.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rand::Rng;
use rand::seq::IndexedRandom;
use tokio::task::AbortHandle;
use tracing::info;

use crate::config::StoreConfig;
use crate::services::message::append_message;
use crate::state::{AppState, ChatState, Message};

pub const CANNED_REPLIES: &[&str] = &[
    "Good question. There are a few moving parts here, and they tend to affect each other, so it helps to look at \
     the whole picture before settling on an answer.\n\nI would start from the fundamentals, test your \
     assumptions against a small example, and build up from there.",
    "Thanks for raising this. The short version is that it depends on the constraints you care about most.\n\n\
     If you can tell me a bit more about your goal, I can narrow it down to one or two concrete options and walk \
     through the trade-offs of each.",
    "Interesting topic! Seen from a few different angles, the same patterns keep showing up, which usually means \
     there is a simpler underlying idea.\n\nA practical next step would be to sketch the problem end to end and \
     see which piece is actually holding things up.",
];

// =============================================================================
// RESPONDER
// =============================================================================

/// Side-table of pending reply tasks plus per-chatroom responding status.
#[derive(Clone, Default)]
pub struct Responder {
    inner: Arc<Mutex<ResponderInner>>,
}

#[derive(Default)]
struct ResponderInner {
    next_ticket: u64,
    /// chatroom ID -> ticket -> abort handle of the reply task.
    pending: HashMap<String, HashMap<u64, AbortHandle>>,
    /// chatroom ID -> tickets currently in the thinking phase.
    thinking: HashMap<String, HashSet<u64>>,
}

impl Responder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ResponderInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a reply is currently "thinking" in this chatroom.
    #[must_use]
    pub fn is_responding(&self, chatroom_id: &str) -> bool {
        self.lock()
            .thinking
            .get(chatroom_id)
            .is_some_and(|tickets| !tickets.is_empty())
    }

    /// Whether any chatroom is responding.
    #[must_use]
    pub fn any_responding(&self) -> bool {
        self.lock().thinking.values().any(|tickets| !tickets.is_empty())
    }

    /// IDs of every responding chatroom, sorted.
    #[must_use]
    pub fn responding_chatrooms(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .lock()
            .thinking
            .iter()
            .filter(|(_, tickets)| !tickets.is_empty())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Number of reply tasks not yet finished for a chatroom.
    #[must_use]
    pub fn pending_count(&self, chatroom_id: &str) -> usize {
        self.lock().pending.get(chatroom_id).map_or(0, HashMap::len)
    }

    /// Abort every pending reply for a chatroom. Returns how many were aborted.
    pub fn cancel(&self, chatroom_id: &str) -> usize {
        let mut inner = self.lock();
        inner.thinking.remove(chatroom_id);
        let Some(tasks) = inner.pending.remove(chatroom_id) else {
            return 0;
        };
        for handle in tasks.values() {
            handle.abort();
        }
        tasks.len()
    }

    /// Abort every pending reply. Returns how many were aborted.
    pub fn cancel_all(&self) -> usize {
        let mut inner = self.lock();
        inner.thinking.clear();
        let mut aborted = 0;
        for (_, tasks) in inner.pending.drain() {
            for handle in tasks.values() {
                handle.abort();
            }
            aborted += tasks.len();
        }
        aborted
    }

    /// Enter the thinking phase. `false` if the ticket was cancelled.
    fn begin_thinking(&self, chatroom_id: &str, ticket: u64) -> bool {
        let mut inner = self.lock();
        let still_pending = inner
            .pending
            .get(chatroom_id)
            .is_some_and(|tasks| tasks.contains_key(&ticket));
        if still_pending {
            inner
                .thinking
                .entry(chatroom_id.to_owned())
                .or_default()
                .insert(ticket);
        }
        still_pending
    }

    fn finish(&self, chatroom_id: &str, ticket: u64) {
        let mut inner = self.lock();
        if let Some(tickets) = inner.thinking.get_mut(chatroom_id) {
            tickets.remove(&ticket);
            if tickets.is_empty() {
                inner.thinking.remove(chatroom_id);
            }
        }
        if let Some(tasks) = inner.pending.get_mut(chatroom_id) {
            tasks.remove(&ticket);
            if tasks.is_empty() {
                inner.pending.remove(chatroom_id);
            }
        }
    }
}

// =============================================================================
// SCHEDULING
// =============================================================================

/// Schedule one AI reply for a chatroom. Returns `false` without scheduling
/// anything when the chatroom does not exist.
///
/// `chat` is the caller's guard on `state.chat` (read or write).
/// `delete_chatroom` cancels under the write lock, so a reply registered
/// while the guard is held can never outlive its chatroom.
pub fn schedule_reply(state: &AppState, chat: &ChatState, chatroom_id: &str) -> bool {
    if chat.chatroom(chatroom_id).is_none() {
        info!(%chatroom_id, "reply not scheduled: chatroom not found");
        return false;
    }

    // Registration happens under the lock the task needs to make progress,
    // so the task can never observe itself as unregistered.
    let mut inner = state.responder.lock();
    let ticket = inner.next_ticket;
    inner.next_ticket += 1;

    let task_state = state.clone();
    let room_id = chatroom_id.to_owned();
    let handle = tokio::spawn(async move {
        run_reply(task_state, room_id, ticket).await;
    });
    inner
        .pending
        .entry(chatroom_id.to_owned())
        .or_default()
        .insert(ticket, handle.abort_handle());

    info!(%chatroom_id, ticket, delay_ms = state.config.reply_delay.as_millis(), "ai reply scheduled");
    true
}

async fn run_reply(state: AppState, chatroom_id: String, ticket: u64) {
    tokio::time::sleep(state.config.reply_delay).await;

    // PHASE: THINKING
    if !state.responder.begin_thinking(&chatroom_id, ticket) {
        return;
    }
    let (thinking, reply) = pick_reply(&state.config);
    info!(%chatroom_id, ticket, thinking_ms = thinking.as_millis(), "ai reply thinking");
    tokio::time::sleep(thinking).await;

    // PHASE: DELIVER
    // EDGE: the chatroom may have been deleted while this task was waiting
    // on the chat lock; append refuses and the reply is dropped.
    let message = Message::ai(reply);
    let message_id = message.id.clone();
    let delivered = append_message(&state, &chatroom_id, message).await;
    state.responder.finish(&chatroom_id, ticket);

    if delivered {
        info!(%chatroom_id, ticket, %message_id, "ai reply delivered");
    } else {
        info!(%chatroom_id, ticket, "ai reply discarded: chatroom gone");
    }
}

/// Draw a thinking time uniformly from the configured range and a canned reply.
fn pick_reply(config: &StoreConfig) -> (Duration, &'static str) {
    let mut rng = rand::rng();
    let thinking = rng.random_range(config.thinking_min..=config.thinking_max);
    let reply = CANNED_REPLIES.choose(&mut rng).copied().unwrap_or("");
    (thinking, reply)
}

#[cfg(test)]
#[path = "responder_test.rs"]
mod tests;
