//! Cursor, line wrapping and pagination for the panel.
//!
//! The pager consumes one character at a time. Newlines and over-long
//! lines advance the cursor by one glyph row; once the next row would not
//! fit, the page is held for a reading pause and then cleared.

use std::time::Duration;

use crate::config::DisplayConfig;
use crate::display::{DisplaySurface, PanelGeometry, Rgb565};
use crate::queue::CharQueue;
use crate::shutdown::ShutdownHandle;

/// Renderer state, observable between characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerState {
    Typing,
    LineBreak,
    PageBreak,
    Idle,
}

/// Top-left pixel of the next glyph cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub x: u32,
    pub y: u32,
}

/// Fixed waits used by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagerTiming {
    /// Hold before clearing a full page.
    pub page_pause: Duration,
    /// Sleep when the queue is empty.
    pub idle: Duration,
}

impl Default for PagerTiming {
    fn default() -> Self {
        Self::from(&DisplayConfig::default())
    }
}

impl From<&DisplayConfig> for PagerTiming {
    fn from(config: &DisplayConfig) -> Self {
        Self {
            page_pause: Duration::from_millis(config.page_pause_ms),
            idle: Duration::from_millis(config.idle_ms),
        }
    }
}

/// Per-run renderer counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub drawn: u64,
    pub skipped: u64,
    pub pages: u64,
}

pub struct Pager<S> {
    surface: S,
    geometry: PanelGeometry,
    color: Rgb565,
    timing: PagerTiming,
    cursor: Cursor,
    state: PagerState,
    stats: RenderStats,
}

impl<S: DisplaySurface> Pager<S> {
    pub fn new(surface: S, geometry: PanelGeometry, color: Rgb565, timing: PagerTiming) -> Self {
        Self {
            surface,
            geometry,
            color,
            timing,
            cursor: Cursor::default(),
            state: PagerState::Typing,
            stats: RenderStats::default(),
        }
    }

    pub fn from_config(surface: S, config: &DisplayConfig) -> Self {
        let [r, g, b] = config.color;
        Self::new(
            surface,
            PanelGeometry::from(config),
            Rgb565::from_rgb(r, g, b),
            PagerTiming::from(config),
        )
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn state(&self) -> PagerState {
        self.state
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Move the cursor home and zero the counters. Does not touch the panel.
    pub fn reset(&mut self) {
        self.cursor = Cursor::default();
        self.state = PagerState::Typing;
        self.stats = RenderStats::default();
    }

    /// Blank the panel and move the cursor home.
    pub fn clear(&mut self) {
        self.cursor = Cursor::default();
        if let Err(err) = self.surface.clear() {
            tracing::warn!(error = %err, "display clear failed");
        }
    }

    /// Render one character, pausing for a page break if one is due.
    pub async fn write_char(&mut self, ch: char) {
        if ch == '\n' || ch == '\r' {
            self.state = PagerState::LineBreak;
            self.line_feed().await;
            self.state = PagerState::Typing;
            return;
        }

        self.state = PagerState::Typing;
        if self.cursor.x + self.geometry.char_width > self.geometry.max_x {
            self.line_feed().await;
            self.state = PagerState::Typing;
        }

        let Cursor { x, y } = self.cursor;
        if !self.geometry.contains(x, y) {
            self.stats.skipped += 1;
            return;
        }

        match self.surface.draw_char(x, y, ch, self.color) {
            Ok(()) => {
                self.cursor.x += self.geometry.char_width;
                self.stats.drawn += 1;
            }
            Err(err) => {
                self.stats.skipped += 1;
                tracing::warn!(error = %err, ?ch, x, y, "draw failed, skipping character");
            }
        }
    }

    /// Drain `queue` until `stop` is raised. Returns the counters for this run.
    ///
    /// A stop is only observed between characters, so a page pause in
    /// progress runs to completion first.
    pub async fn run(&mut self, queue: &CharQueue, stop: &ShutdownHandle) -> RenderStats {
        let before = self.stats;
        while !stop.is_shutting_down() {
            match queue.get() {
                Some(ch) => {
                    self.write_char(ch).await;
                    tokio::task::yield_now().await;
                }
                None => {
                    self.state = PagerState::Idle;
                    tokio::time::sleep(self.timing.idle).await;
                }
            }
        }
        RenderStats {
            drawn: self.stats.drawn - before.drawn,
            skipped: self.stats.skipped - before.skipped,
            pages: self.stats.pages - before.pages,
        }
    }

    async fn line_feed(&mut self) {
        self.cursor.x = 0;
        self.cursor.y += self.geometry.char_height;
        if self.cursor.y + self.geometry.char_height > self.geometry.max_y {
            self.page_break().await;
        }
    }

    async fn page_break(&mut self) {
        self.state = PagerState::PageBreak;
        self.cursor = Cursor::default();
        self.stats.pages += 1;
        tracing::info!(page = self.stats.pages, "page full, holding before clear");
        tokio::time::sleep(self.timing.page_pause).await;
        if let Err(err) = self.surface.clear() {
            tracing::warn!(error = %err, "display clear failed");
        }
    }
}
