use std::sync::Arc;

use super::*;
use crate::state::test_helpers::*;

const NOW: i64 = 1_700_000_000_000;

fn room_with(messages: Vec<Message>) -> Chatroom {
    let mut room = Chatroom::new("history");
    for m in messages {
        room.push_message(m);
    }
    room
}

// =============================================================================
// synthesize_page
// =============================================================================

#[test]
fn page_zero_pads_to_one_page() {
    let room = room_with(
        (0..5)
            .map(|i| message_at(&format!("m{i}"), NOW + i * 1000, Sender::User))
            .collect(),
    );

    let page = synthesize_page(&room, 0, 20, 60_000, NOW + 10_000);
    assert_eq!(page.len(), 15);

    let oldest = room.oldest_timestamp().unwrap();
    assert!(page.iter().all(|m| m.timestamp < oldest));

    let existing: HashSet<&str> = room.messages.iter().map(|m| m.id.as_str()).collect();
    let generated: HashSet<&str> = page.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(generated.len(), page.len());
    assert!(generated.is_disjoint(&existing));
}

#[test]
fn page_zero_full_room_is_empty() {
    let room = room_with(
        (0..20)
            .map(|i| message_at(&format!("m{i}"), NOW + i, Sender::Ai))
            .collect(),
    );
    assert!(synthesize_page(&room, 0, 20, 60_000, NOW).is_empty());
}

#[test]
fn later_pages_are_full_and_step_back_in_time() {
    let room = room_with(vec![message_at("only", NOW, Sender::User)]);

    let page = synthesize_page(&room, 2, 20, 60_000, NOW);
    assert_eq!(page.len(), 20);
    // page 2 starts at ordinal 41.
    assert_eq!(page[0].timestamp, NOW - 41 * 60_000);
    assert_eq!(page[19].timestamp, NOW - 60 * 60_000);
    assert!(page.windows(2).all(|w| w[0].timestamp - w[1].timestamp == 60_000));
    assert_eq!(page[0].content, "Earlier message #41");
}

#[test]
fn empty_room_anchors_on_generation_time() {
    let room = Chatroom::new("empty");
    let page = synthesize_page(&room, 0, 3, 1000, NOW);
    let stamps: Vec<i64> = page.iter().map(|m| m.timestamp).collect();
    assert_eq!(stamps, vec![NOW - 1000, NOW - 2000, NOW - 3000]);
}

#[test]
fn generated_ids_avoid_stored_collisions() {
    let clash = format!("history-0-0-{NOW}");
    let room = room_with(vec![message_at(&clash, NOW, Sender::User)]);

    let page = synthesize_page(&room, 0, 3, 1000, NOW);
    assert_eq!(page.len(), 2);
    assert!(page.iter().all(|m| m.id != clash));
    assert_eq!(page[0].id, format!("{clash}-1"));
}

// =============================================================================
// SyntheticHistory / load_more_messages
// =============================================================================

#[tokio::test]
async fn max_pages_caps_history() {
    let source = SyntheticHistory {
        page_size: 4,
        step_ms: 1000,
        latency: Duration::ZERO,
        max_pages: 1,
    };
    let room = Chatroom::new("capped");
    assert_eq!(source.fetch_history_page(&room, 1).await.len(), 4);
    assert!(source.fetch_history_page(&room, 2).await.is_empty());
}

#[tokio::test]
async fn load_more_messages_does_not_store_history() {
    let (state, _dir) = test_app_state();
    let messages = (0..5)
        .map(|i| message_at(&format!("m{i}"), NOW + i, Sender::User))
        .collect();
    let id = seed_chatroom_with_messages(&state, "five", messages).await;

    let page = load_more_messages(&state, &id, 0).await;
    assert_eq!(page.len(), 15);
    assert!(page.iter().all(|m| m.timestamp < NOW));

    assert_eq!(state.chat.read().await.chatroom(&id).unwrap().messages.len(), 5);
    assert!(!state.ui.read().await.loading.messages);
}

#[tokio::test]
async fn load_more_messages_unknown_chatroom_is_empty() {
    let (state, _dir) = test_app_state();
    assert!(load_more_messages(&state, "missing", 0).await.is_empty());
}

struct FixedHistory;

#[async_trait::async_trait]
impl HistorySource for FixedHistory {
    async fn fetch_history_page(&self, _chatroom: &Chatroom, page: u32) -> Vec<Message> {
        if page == 0 { vec![message_at("backend-1", 1, Sender::Ai)] } else { Vec::new() }
    }
}

#[tokio::test]
async fn load_more_messages_uses_configured_source() {
    let (state, _dir) = test_app_state();
    let state = state.with_history(Arc::new(FixedHistory));
    let id = seed_chatroom(&state, "backend").await;

    let page = load_more_messages(&state, &id, 0).await;
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, "backend-1");
    assert!(load_more_messages(&state, &id, 1).await.is_empty());
}

/// Sleeps `delays[page]` before answering with an empty page.
struct SlowHistory {
    delays: Vec<Duration>,
}

#[async_trait::async_trait]
impl HistorySource for SlowHistory {
    async fn fetch_history_page(&self, _chatroom: &Chatroom, page: u32) -> Vec<Message> {
        let delay = self.delays.get(page as usize).copied().unwrap_or_default();
        tokio::time::sleep(delay).await;
        Vec::new()
    }
}

async fn messages_loading(state: &AppState) -> bool {
    state.ui.read().await.loading.messages
}

#[tokio::test]
async fn cancelled_load_releases_loading_flag() {
    let (state, _dir) = test_app_state();
    let state = state.with_history(Arc::new(SlowHistory { delays: vec![Duration::from_millis(500)] }));
    let id = seed_chatroom(&state, "slow").await;

    let task = {
        let state = state.clone();
        tokio::spawn(async move { load_more_messages(&state, &id, 0).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(messages_loading(&state).await);

    task.abort();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!messages_loading(&state).await);
}

#[tokio::test]
async fn overlapping_loads_keep_flag_until_last_finishes() {
    let (state, _dir) = test_app_state();
    let state = state.with_history(Arc::new(SlowHistory {
        delays: vec![Duration::from_millis(50), Duration::from_millis(250)],
    }));
    let id = seed_chatroom(&state, "overlap").await;

    let quick = {
        let (state, id) = (state.clone(), id.clone());
        tokio::spawn(async move { load_more_messages(&state, &id, 0).await })
    };
    let slow = {
        let (state, id) = (state.clone(), id.clone());
        tokio::spawn(async move { load_more_messages(&state, &id, 1).await })
    };

    quick.await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(messages_loading(&state).await);

    slow.await.unwrap();
    assert!(!messages_loading(&state).await);
}
