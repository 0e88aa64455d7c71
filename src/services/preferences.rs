//! UI preferences — dark mode, sidebar, and loading flags.
//!
//! Only `dark_mode` is durable (its own `ui-storage` record). The sidebar
//! and loading flags are per-process session state. Loading flags are a
//! fixed set addressed by [`LoadingKey`], never by free-form strings.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::services::persistence::{Record, UiSnapshot};
use crate::state::AppState;

/// Named loading flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadingKey {
    Messages,
    Chatrooms,
    Auth,
}

impl LoadingKey {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Messages => "messages",
            Self::Chatrooms => "chatrooms",
            Self::Auth => "auth",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "messages" => Some(Self::Messages),
            "chatrooms" => Some(Self::Chatrooms),
            "auth" => Some(Self::Auth),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadingFlags {
    pub messages: bool,
    pub chatrooms: bool,
    pub auth: bool,
    /// History fetches in flight; `messages` stays raised while any runs.
    #[serde(skip)]
    messages_in_flight: u32,
}

impl LoadingFlags {
    #[must_use]
    pub fn get(&self, key: LoadingKey) -> bool {
        match key {
            LoadingKey::Messages => self.messages,
            LoadingKey::Chatrooms => self.chatrooms,
            LoadingKey::Auth => self.auth,
        }
    }

    pub fn set(&mut self, key: LoadingKey, value: bool) {
        match key {
            LoadingKey::Messages => self.messages = value,
            LoadingKey::Chatrooms => self.chatrooms = value,
            LoadingKey::Auth => self.auth = value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UiState {
    pub dark_mode: bool,
    pub sidebar_open: bool,
    pub loading: LoadingFlags,
}

impl Default for UiState {
    fn default() -> Self {
        Self { dark_mode: false, sidebar_open: true, loading: LoadingFlags::default() }
    }
}

impl UiState {
    #[must_use]
    pub fn from_snapshot(snapshot: UiSnapshot) -> Self {
        Self { dark_mode: snapshot.dark_mode, ..Self::default() }
    }

    #[must_use]
    pub fn snapshot(&self) -> UiSnapshot {
        UiSnapshot { dark_mode: self.dark_mode }
    }
}

// =============================================================================
// OPERATIONS
// =============================================================================

pub async fn get_preferences(state: &AppState) -> UiState {
    *state.ui.read().await
}

/// Set dark mode. Returns the new value.
pub async fn set_dark_mode(state: &AppState, enabled: bool) -> bool {
    let changed = {
        let mut ui = state.ui.write().await;
        let changed = ui.dark_mode != enabled;
        ui.dark_mode = enabled;
        changed
    };
    if changed {
        state.persist.mark_dirty(Record::Ui);
        info!(dark_mode = enabled, "preference changed");
    }
    enabled
}

/// Flip dark mode. Returns the new value.
pub async fn toggle_dark_mode(state: &AppState) -> bool {
    let enabled = {
        let mut ui = state.ui.write().await;
        ui.dark_mode = !ui.dark_mode;
        ui.dark_mode
    };
    state.persist.mark_dirty(Record::Ui);
    info!(dark_mode = enabled, "preference changed");
    enabled
}

pub async fn set_sidebar_open(state: &AppState, open: bool) {
    state.ui.write().await.sidebar_open = open;
}

/// Count one more in-flight history fetch and raise the `messages` flag.
pub async fn begin_messages_load(state: &AppState) {
    let mut ui = state.ui.write().await;
    ui.loading.messages_in_flight = ui.loading.messages_in_flight.saturating_add(1);
    ui.loading.messages = true;
}

/// Finish one history fetch. The `messages` flag drops only when the last
/// overlapping fetch finishes.
pub async fn end_messages_load(state: &AppState) {
    let mut ui = state.ui.write().await;
    ui.loading.messages_in_flight = ui.loading.messages_in_flight.saturating_sub(1);
    ui.loading.messages = ui.loading.messages_in_flight > 0;
}

pub async fn set_loading(state: &AppState, key: LoadingKey, value: bool) {
    state.ui.write().await.loading.set(key, value);
    debug!(key = key.as_str(), value, "loading flag set");
}

#[cfg(test)]
#[path = "preferences_test.rs"]
mod tests;
