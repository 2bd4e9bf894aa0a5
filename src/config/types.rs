use serde::{Deserialize, Serialize};

use crate::queue::OverflowPolicy;

/// Root configuration container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub request: RequestConfig,
}

/// Panel geometry and render timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Rightmost valid pixel column (inclusive).
    #[serde(default = "default_max_x")]
    pub max_x: u32,
    /// Bottom valid pixel row (inclusive).
    #[serde(default = "default_max_y")]
    pub max_y: u32,
    /// Glyph cell width in pixels.
    #[serde(default = "default_char_width")]
    pub char_width: u32,
    /// Glyph cell height in pixels.
    #[serde(default = "default_char_height")]
    pub char_height: u32,
    /// Text colour as an RGB triple.
    #[serde(default = "default_color")]
    pub color: [u8; 3],
    /// Reading pause before a full page is cleared.
    #[serde(default = "default_page_pause_ms")]
    pub page_pause_ms: u64,
    /// Renderer sleep when the queue is empty.
    #[serde(default = "default_idle_ms")]
    pub idle_ms: u64,
    /// Poll interval while waiting for the queue to drain.
    #[serde(default = "default_drain_poll_ms")]
    pub drain_poll_ms: u64,
    /// Upper bound on the drain wait at session end.
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,
}

/// Ingestion and buffering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Characters held between the decoder and the renderer.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Maximum bytes requested from the response body per read.
    #[serde(default = "default_read_chunk_size")]
    pub read_chunk_size: usize,
    /// What to discard when the queue is full.
    #[serde(default)]
    pub overflow: OverflowPolicy,
    /// Pause after ingestion ends, before the drain starts.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

/// Chat-completions request options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Chat-completions endpoint.
    #[serde(default = "default_url")]
    pub url: String,
    /// Bearer token. Falls back to `CHATPANE_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_n")]
    pub n: u32,
    /// Must stay `true`; the pipeline only understands SSE bodies.
    #[serde(default = "default_stream")]
    pub stream: bool,
    /// Defaults to the queue capacity when unset.
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub presence_penalty: f32,
    #[serde(default)]
    pub frequency_penalty: f32,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

/// Environment variable consulted when `request.api_key` is not set.
pub const API_KEY_ENV: &str = "CHATPANE_API_KEY";

impl Config {
    /// `max_tokens` as sent on the wire.
    pub fn max_tokens(&self) -> u32 {
        self.request
            .max_tokens
            .unwrap_or_else(|| u32::try_from(self.stream.queue_capacity).unwrap_or(u32::MAX))
    }
}

impl RequestConfig {
    /// Configured key, or the value of [`API_KEY_ENV`].
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|key| !key.is_empty()))
    }
}

fn default_max_x() -> u32 {
    319
}

fn default_max_y() -> u32 {
    239
}

fn default_char_width() -> u32 {
    9
}

fn default_char_height() -> u32 {
    19
}

fn default_color() -> [u8; 3] {
    [255, 255, 0]
}

fn default_page_pause_ms() -> u64 {
    1000
}

fn default_idle_ms() -> u64 {
    1
}

fn default_drain_poll_ms() -> u64 {
    10
}

fn default_drain_timeout_ms() -> u64 {
    30_000
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_read_chunk_size() -> usize {
    1024
}

fn default_settle_ms() -> u64 {
    100
}

fn default_url() -> String {
    "https://open.bigmodel.cn/api/paas/v4/chat/completions".to_string()
}

fn default_model() -> String {
    "glm-4-flash".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    1.0
}

fn default_n() -> u32 {
    1
}

fn default_stream() -> bool {
    true
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_x: default_max_x(),
            max_y: default_max_y(),
            char_width: default_char_width(),
            char_height: default_char_height(),
            color: default_color(),
            page_pause_ms: default_page_pause_ms(),
            idle_ms: default_idle_ms(),
            drain_poll_ms: default_drain_poll_ms(),
            drain_timeout_ms: default_drain_timeout_ms(),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            read_chunk_size: default_read_chunk_size(),
            overflow: OverflowPolicy::default(),
            settle_ms: default_settle_ms(),
        }
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            n: default_n(),
            stream: default_stream(),
            max_tokens: None,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}
