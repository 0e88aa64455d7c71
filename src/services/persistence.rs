//! Persistence service — whole-state JSON snapshots in a data directory.
//!
//! DESIGN
//! ======
//! Two independent durable records live side by side: the chatroom list
//! (`chat-storage.json`) and the UI preference record (`ui-storage.json`).
//! Every mutation bumps the record's dirty generation and wakes a background
//! worker, which snapshots under the read lock and writes outside it. Bursts
//! of mutations coalesce into one write of the latest state.
//!
//! ERROR HANDLING
//! ==============
//! Storage errors never reach chat operations. Absent or corrupt records
//! load as empty defaults. A record's flushed generation only advances after
//! a successful write, so a failed write stays dirty and is retried on the
//! worker's next wake.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::services::preferences::UiState;
use crate::state::{AppState, ChatState, Chatroom};

pub const CHAT_NAMESPACE: &str = "chat-storage";
pub const UI_NAMESPACE: &str = "ui-storage";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Persisted form of the chatroom list. Registry selection and the search
/// filter are session state and are not stored.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ChatSnapshot {
    #[serde(default)]
    pub chatrooms: Vec<Chatroom>,
}

/// Persisted form of the UI preferences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiSnapshot {
    #[serde(default)]
    pub dark_mode: bool,
}

/// Which durable record a mutation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record {
    Chat,
    Ui,
}

// =============================================================================
// STORAGE
// =============================================================================

/// Namespaced JSON records under one directory.
#[derive(Debug, Clone)]
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    #[must_use]
    pub fn path(&self, namespace: &str) -> PathBuf {
        self.dir.join(format!("{namespace}.json"))
    }

    /// Read a record, falling back to `T::default()` when it is absent,
    /// unreadable, or corrupt.
    pub async fn read<T>(&self, namespace: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        let path = self.path(namespace);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(e) => {
                    warn!(error = %e, path = %path.display(), "corrupt record; using defaults");
                    T::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no stored record; using defaults");
                T::default()
            }
            Err(e) => {
                error!(error = %e, path = %path.display(), "record read failed; using defaults");
                T::default()
            }
        }
    }

    /// Replace a record. Writes a temp file and renames it over the target.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any filesystem step fails.
    pub async fn write<T>(&self, namespace: &str, value: &T) -> Result<(), StorageError>
    where
        T: Serialize,
    {
        let json = serde_json::to_vec_pretty(value)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path(namespace);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

/// Rehydrate both records at startup.
pub async fn load_state(storage: &Storage) -> (ChatState, UiState) {
    let chat: ChatSnapshot = storage.read(CHAT_NAMESPACE).await;
    let ui: UiSnapshot = storage.read(UI_NAMESPACE).await;
    (ChatState::from_chatrooms(chat.chatrooms), UiState::from_snapshot(ui))
}

// =============================================================================
// DIRTY TRACKING
// =============================================================================

#[derive(Default)]
struct DirtyCounter {
    generation: AtomicU64,
    flushed: AtomicU64,
}

impl DirtyCounter {
    fn pending(&self) -> Option<u64> {
        let generation = self.generation.load(Ordering::SeqCst);
        (generation != self.flushed.load(Ordering::SeqCst)).then_some(generation)
    }
}

#[derive(Default)]
struct PersistInner {
    chat: DirtyCounter,
    ui: DirtyCounter,
    notify: Notify,
    /// Serializes writers so the worker and shutdown never race on a file.
    flush_lock: Mutex<()>,
}

/// Dirty generations per record plus the worker wakeup.
#[derive(Clone, Default)]
pub struct PersistTracker {
    inner: Arc<PersistInner>,
}

impl PersistTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, record: Record) -> &DirtyCounter {
        match record {
            Record::Chat => &self.inner.chat,
            Record::Ui => &self.inner.ui,
        }
    }

    /// Record a mutation and wake the worker.
    pub fn mark_dirty(&self, record: Record) {
        self.counter(record).generation.fetch_add(1, Ordering::SeqCst);
        self.inner.notify.notify_one();
    }

    #[must_use]
    pub fn is_dirty(&self, record: Record) -> bool {
        self.counter(record).pending().is_some()
    }

    fn mark_flushed(&self, record: Record, generation: u64) {
        self.counter(record)
            .flushed
            .fetch_max(generation, Ordering::SeqCst);
    }
}

// =============================================================================
// WORKER
// =============================================================================

/// Spawn the background persistence task. Returns a handle for shutdown.
pub fn spawn_persistence_task(state: AppState) -> JoinHandle<()> {
    let flush_interval = state.config.flush_interval;
    info!(flush_interval_ms = flush_interval.as_millis(), "snapshot persistence configured");
    tokio::spawn(async move {
        loop {
            tokio::select! {
                () = state.persist.inner.notify.notified() => {}
                () = tokio::time::sleep(flush_interval) => {}
            }
            flush_dirty(&state).await;
        }
    })
}

/// Write every dirty record.
pub async fn flush_dirty(state: &AppState) {
    let _guard = state.persist.inner.flush_lock.lock().await;
    flush_chat(state).await;
    flush_ui(state).await;
}

async fn flush_chat(state: &AppState) {
    // PHASE: SNAPSHOT UNDER LOCK
    // WHY: generation is read before the snapshot so a concurrent mutation
    // leaves the record dirty.
    let Some(generation) = state.persist.counter(Record::Chat).pending() else {
        return;
    };
    let snapshot = {
        let chat = state.chat.read().await;
        ChatSnapshot { chatrooms: chat.chatrooms.clone() }
    };

    // PHASE: WRITE OUTSIDE LOCK
    match state.storage.write(CHAT_NAMESPACE, &snapshot).await {
        Ok(()) => {
            state.persist.mark_flushed(Record::Chat, generation);
            debug!(generation, chatrooms = snapshot.chatrooms.len(), "chat snapshot written");
        }
        Err(e) => {
            error!(error = %e, generation, "chat snapshot write failed");
        }
    }
}

async fn flush_ui(state: &AppState) {
    let Some(generation) = state.persist.counter(Record::Ui).pending() else {
        return;
    };
    let snapshot = state.ui.read().await.snapshot();

    match state.storage.write(UI_NAMESPACE, &snapshot).await {
        Ok(()) => {
            state.persist.mark_flushed(Record::Ui, generation);
            debug!(generation, "ui snapshot written");
        }
        Err(e) => {
            error!(error = %e, generation, "ui snapshot write failed");
        }
    }
}

/// Store teardown: drop every pending AI reply, then write what is dirty.
pub async fn shutdown(state: &AppState) {
    let cancelled = state.responder.cancel_all();
    info!(cancelled, "chat store shutting down");
    flush_dirty(state).await;
    if state.persist.is_dirty(Record::Chat) || state.persist.is_dirty(Record::Ui) {
        warn!("final snapshot incomplete; unsaved changes lost");
    }
}

#[cfg(test)]
#[path = "persistence_test.rs"]
mod tests;
