//! Store configuration parsed from environment variables.
//!
//! DESIGN
//! ======
//! Every knob has a compiled-in default; an unset or unparseable variable
//! falls back to it rather than failing startup. Timer knobs exist mostly so
//! tests can run the responder at millisecond scale.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const DEFAULT_AI_REPLY_DELAY_MS: u64 = 1000;
pub const DEFAULT_AI_THINKING_MIN_MS: u64 = 1500;
pub const DEFAULT_AI_THINKING_MAX_MS: u64 = 3500;
pub const DEFAULT_HISTORY_STEP_MS: i64 = 60_000;
pub const DEFAULT_HISTORY_LATENCY_MS: u64 = 300;
pub const DEFAULT_HISTORY_MAX_PAGES: u32 = 0;
pub const DEFAULT_MAX_VIEW_PAGES: u32 = 10;
pub const DEFAULT_PERSIST_FLUSH_INTERVAL_MS: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// HTTP listen port.
    pub port: u16,
    /// Directory holding the durable JSON records.
    pub data_dir: PathBuf,
    /// Messages per page for history generation and stored-page reads.
    pub page_size: usize,
    /// Delay between a user send and the start of the AI "thinking" phase.
    pub reply_delay: Duration,
    /// Lower bound of the randomized thinking time.
    pub thinking_min: Duration,
    /// Upper bound of the randomized thinking time.
    pub thinking_max: Duration,
    /// Spacing between synthetic history timestamps, in milliseconds.
    pub history_step_ms: i64,
    /// Simulated latency of one history fetch.
    pub history_latency: Duration,
    /// Last page the history generator serves. `0` means unlimited.
    pub history_max_pages: u32,
    /// Most history pages one merged-view request may pull in.
    pub max_view_pages: u32,
    /// How often the persistence worker wakes without a mutation signal.
    pub flush_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            page_size: DEFAULT_PAGE_SIZE,
            reply_delay: Duration::from_millis(DEFAULT_AI_REPLY_DELAY_MS),
            thinking_min: Duration::from_millis(DEFAULT_AI_THINKING_MIN_MS),
            thinking_max: Duration::from_millis(DEFAULT_AI_THINKING_MAX_MS),
            history_step_ms: DEFAULT_HISTORY_STEP_MS,
            history_latency: Duration::from_millis(DEFAULT_HISTORY_LATENCY_MS),
            history_max_pages: DEFAULT_HISTORY_MAX_PAGES,
            max_view_pages: DEFAULT_MAX_VIEW_PAGES,
            flush_interval: Duration::from_millis(DEFAULT_PERSIST_FLUSH_INTERVAL_MS),
        }
    }
}

impl StoreConfig {
    /// Build typed store config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `CHAT_DATA_DIR`: default `./data`
    /// - `CHAT_PAGE_SIZE`: default 20
    /// - `AI_REPLY_DELAY_MS`: default 1000
    /// - `AI_THINKING_MIN_MS` / `AI_THINKING_MAX_MS`: default 1500 / 3500
    /// - `HISTORY_STEP_MS`: default 60000
    /// - `HISTORY_LATENCY_MS`: default 300
    /// - `HISTORY_MAX_PAGES`: default 0 (unlimited)
    /// - `CHAT_MAX_VIEW_PAGES`: default 10
    /// - `PERSIST_FLUSH_INTERVAL_MS`: default 100
    #[must_use]
    pub fn from_env() -> Self {
        let data_dir = std::env::var("CHAT_DATA_DIR").map_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from);

        Self {
            port: env_parse("PORT", DEFAULT_PORT),
            data_dir,
            page_size: env_parse("CHAT_PAGE_SIZE", DEFAULT_PAGE_SIZE),
            reply_delay: Duration::from_millis(env_parse("AI_REPLY_DELAY_MS", DEFAULT_AI_REPLY_DELAY_MS)),
            thinking_min: Duration::from_millis(env_parse("AI_THINKING_MIN_MS", DEFAULT_AI_THINKING_MIN_MS)),
            thinking_max: Duration::from_millis(env_parse("AI_THINKING_MAX_MS", DEFAULT_AI_THINKING_MAX_MS)),
            history_step_ms: env_parse("HISTORY_STEP_MS", DEFAULT_HISTORY_STEP_MS),
            history_latency: Duration::from_millis(env_parse("HISTORY_LATENCY_MS", DEFAULT_HISTORY_LATENCY_MS)),
            history_max_pages: env_parse("HISTORY_MAX_PAGES", DEFAULT_HISTORY_MAX_PAGES),
            max_view_pages: env_parse("CHAT_MAX_VIEW_PAGES", DEFAULT_MAX_VIEW_PAGES),
            flush_interval: Duration::from_millis(env_parse(
                "PERSIST_FLUSH_INTERVAL_MS",
                DEFAULT_PERSIST_FLUSH_INTERVAL_MS,
            )),
        }
        .normalized()
    }

    /// Repair combinations that would make the timers or pager misbehave.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.page_size == 0 {
            warn!("CHAT_PAGE_SIZE must be at least 1; using 1");
            self.page_size = 1;
        }
        if self.thinking_min > self.thinking_max {
            warn!(
                min_ms = self.thinking_min.as_millis(),
                max_ms = self.thinking_max.as_millis(),
                "AI thinking bounds inverted; swapping"
            );
            std::mem::swap(&mut self.thinking_min, &mut self.thinking_max);
        }
        if self.history_step_ms <= 0 {
            warn!(step_ms = self.history_step_ms, "HISTORY_STEP_MS must be positive; using default");
            self.history_step_ms = DEFAULT_HISTORY_STEP_MS;
        }
        self
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
