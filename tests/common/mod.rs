//! Shared test utilities: SSE body builders and a fast session config.

#![allow(dead_code, unused_imports)]

use bytes::Bytes;
use chatpane::config::Config;
use chatpane::display::RecordingSurface;
use chatpane::source::ByteSource;
use chatpane::Session;
use std::io;
use std::path::PathBuf;
use tempfile::TempDir;

/// One `data:` line carrying `text` as the delta content.
pub fn content_line(text: &str) -> String {
    let payload = serde_json::json!({
        "choices": [{ "index": 0, "delta": { "role": "assistant", "content": text } }]
    });
    format!("data: {}\n", payload)
}

pub const DONE_LINE: &str = "data: [DONE]\n";

/// A full response body: one event per fragment, blank lines between
/// events as a real server sends them, optionally terminated.
pub fn sse_body(fragments: &[&str], done: bool) -> String {
    let mut body = String::new();
    for fragment in fragments {
        body.push_str(&content_line(fragment));
        body.push('\n');
    }
    if done {
        body.push_str(DONE_LINE);
        body.push('\n');
    }
    body
}

/// Default config with timings shortened for tests.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.display.page_pause_ms = 50;
    config.display.idle_ms = 1;
    config.display.drain_poll_ms = 1;
    config.display.drain_timeout_ms = 2_000;
    config.stream.settle_ms = 5;
    config.request.api_key = Some("test-key".to_string());
    config
}

/// Shrink the panel to a 3x3 grid of 10px cells.
pub fn small_panel(mut config: Config) -> Config {
    config.display.max_x = 30;
    config.display.max_y = 30;
    config.display.char_width = 10;
    config.display.char_height = 10;
    config
}

/// A session over a recording surface, plus a clone sharing its log.
pub fn recording_session(config: Config) -> (Session<RecordingSurface>, RecordingSurface) {
    let surface = RecordingSurface::new();
    let panel = surface.clone();
    (Session::new(config, surface), panel)
}

/// Write `content` to a config file in a fresh temp dir.
pub fn temp_config_file(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, content).expect("Failed to write config");
    (temp_dir, path)
}

/// Serves `body`, then never reaches EOF: every later read stays pending,
/// like a server that stopped sending without closing the connection.
pub struct StallingSource {
    body: Bytes,
}

impl StallingSource {
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self { body: body.into() }
    }
}

impl ByteSource for StallingSource {
    async fn read(&mut self, max_bytes: usize) -> io::Result<Option<Bytes>> {
        if self.body.is_empty() {
            return std::future::pending().await;
        }
        let take = max_bytes.max(1).min(self.body.len());
        Ok(Some(self.body.split_to(take)))
    }
}
