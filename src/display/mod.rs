//! Display surfaces the pager draws onto.
//!
//! The pager only knows [`DisplaySurface`]; concrete panels live in the
//! submodules. Coordinates are pixel offsets of the top-left corner of a
//! glyph cell.

mod recording;
mod terminal;

pub use recording::{DrawOp, RecordingSurface};
pub use terminal::TerminalSurface;

use crate::config::DisplayConfig;
use crate::error::DrawError;

/// 16-bit RGB565 colour as used by small SPI panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb565(pub u16);

impl Rgb565 {
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self((((r as u16) & 0xF8) << 8) | (((g as u16) & 0xFC) << 3) | ((b as u16) >> 3))
    }

    /// Expand back to 8-bit channels (low bits are lost).
    pub const fn to_rgb(self) -> (u8, u8, u8) {
        let r = ((self.0 >> 11) & 0x1F) as u8;
        let g = ((self.0 >> 5) & 0x3F) as u8;
        let b = (self.0 & 0x1F) as u8;
        (r << 3, g << 2, b << 3)
    }
}

/// Pixel bounds and glyph cell size of a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelGeometry {
    /// Rightmost valid pixel column (inclusive).
    pub max_x: u32,
    /// Bottom valid pixel row (inclusive).
    pub max_y: u32,
    pub char_width: u32,
    pub char_height: u32,
}

impl PanelGeometry {
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x <= self.max_x && y <= self.max_y
    }

    /// Whole glyph columns that fit before wrapping.
    pub fn columns(&self) -> u32 {
        self.max_x / self.char_width.max(1)
    }

    /// Whole text lines that fit on one page.
    pub fn rows(&self) -> u32 {
        self.max_y / self.char_height.max(1)
    }
}

impl From<&DisplayConfig> for PanelGeometry {
    fn from(config: &DisplayConfig) -> Self {
        Self {
            max_x: config.max_x,
            max_y: config.max_y,
            char_width: config.char_width,
            char_height: config.char_height,
        }
    }
}

/// A panel that can draw single glyphs and clear itself.
pub trait DisplaySurface {
    /// Draw `ch` with its cell's top-left corner at `(x, y)`.
    fn draw_char(&mut self, x: u32, y: u32, ch: char, color: Rgb565) -> Result<(), DrawError>;

    /// Blank the whole panel.
    fn clear(&mut self) -> Result<(), DrawError>;
}

impl<S: DisplaySurface + ?Sized> DisplaySurface for Box<S> {
    fn draw_char(&mut self, x: u32, y: u32, ch: char, color: Rgb565) -> Result<(), DrawError> {
        (**self).draw_char(x, y, ch, color)
    }

    fn clear(&mut self) -> Result<(), DrawError> {
        (**self).clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color565_matches_panel_encoding() {
        assert_eq!(Rgb565::from_rgb(255, 255, 0), Rgb565(0xFFE0));
        assert_eq!(Rgb565::from_rgb(0, 0, 255), Rgb565(0x001F));
        assert_eq!(Rgb565::from_rgb(255, 0, 0).to_rgb(), (248, 0, 0));
    }

    #[test]
    fn default_geometry_grid() {
        let geometry = PanelGeometry::from(&DisplayConfig::default());
        assert_eq!(geometry.columns(), 35);
        assert_eq!(geometry.rows(), 12);
        assert!(geometry.contains(319, 239));
        assert!(!geometry.contains(320, 0));
    }
}
