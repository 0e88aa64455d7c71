use super::*;

/// # Safety
/// Tests must run with `--test-threads=1` to avoid env races.
unsafe fn clear_store_env() {
    unsafe {
        for key in [
            "PORT",
            "CHAT_DATA_DIR",
            "CHAT_PAGE_SIZE",
            "AI_REPLY_DELAY_MS",
            "AI_THINKING_MIN_MS",
            "AI_THINKING_MAX_MS",
            "HISTORY_STEP_MS",
            "HISTORY_LATENCY_MS",
            "HISTORY_MAX_PAGES",
            "CHAT_MAX_VIEW_PAGES",
            "PERSIST_FLUSH_INTERVAL_MS",
        ] {
            std::env::remove_var(key);
        }
    }
}

// =============================================================================
// env_parse
// =============================================================================

#[test]
fn env_parse_missing_returns_default() {
    let val: usize = env_parse("__TEST_CHAT_NONEXISTENT_KEY__", 42);
    assert_eq!(val, 42);
}

#[test]
fn env_parse_present_invalid_returns_default() {
    unsafe { std::env::set_var("__TEST_CHAT_EP_INVALID__", "soon") };
    let val: u64 = env_parse("__TEST_CHAT_EP_INVALID__", 7);
    assert_eq!(val, 7);
    unsafe { std::env::remove_var("__TEST_CHAT_EP_INVALID__") };
}

// =============================================================================
// from_env
// =============================================================================

// Defaults and overrides share one test so the env mutations never interleave.
#[test]
fn from_env_defaults_then_overrides() {
    unsafe { clear_store_env() };

    let cfg = StoreConfig::from_env();
    assert_eq!(cfg, StoreConfig::default());
    assert_eq!(cfg.page_size, 20);
    assert_eq!(cfg.reply_delay, Duration::from_millis(1000));
    assert_eq!(cfg.thinking_min, Duration::from_millis(1500));
    assert_eq!(cfg.thinking_max, Duration::from_millis(3500));
    assert_eq!(cfg.history_step_ms, 60_000);
    assert_eq!(cfg.max_view_pages, 10);

    unsafe {
        std::env::set_var("PORT", "8080");
        std::env::set_var("CHAT_DATA_DIR", "/tmp/chat-test");
        std::env::set_var("CHAT_PAGE_SIZE", "50");
        std::env::set_var("AI_REPLY_DELAY_MS", "10");
        std::env::set_var("HISTORY_MAX_PAGES", "3");
        std::env::set_var("CHAT_MAX_VIEW_PAGES", "4");
    }

    let cfg = StoreConfig::from_env();
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.data_dir, PathBuf::from("/tmp/chat-test"));
    assert_eq!(cfg.page_size, 50);
    assert_eq!(cfg.reply_delay, Duration::from_millis(10));
    assert_eq!(cfg.history_max_pages, 3);
    assert_eq!(cfg.max_view_pages, 4);

    unsafe { clear_store_env() };
}

// =============================================================================
// normalized
// =============================================================================

#[test]
fn normalized_swaps_inverted_thinking_bounds() {
    let cfg = StoreConfig {
        thinking_min: Duration::from_millis(900),
        thinking_max: Duration::from_millis(100),
        ..StoreConfig::default()
    }
    .normalized();
    assert_eq!(cfg.thinking_min, Duration::from_millis(100));
    assert_eq!(cfg.thinking_max, Duration::from_millis(900));
}

#[test]
fn normalized_clamps_zero_page_size() {
    let cfg = StoreConfig { page_size: 0, ..StoreConfig::default() }.normalized();
    assert_eq!(cfg.page_size, 1);
}

#[test]
fn normalized_rejects_non_positive_history_step() {
    let cfg = StoreConfig { history_step_ms: -5, ..StoreConfig::default() }.normalized();
    assert_eq!(cfg.history_step_ms, DEFAULT_HISTORY_STEP_MS);
}
