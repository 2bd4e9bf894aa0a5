use std::io::{self, Stdout, Write};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use crossterm::{execute, queue};

use super::{DisplaySurface, PanelGeometry, Rgb565};
use crate::error::DrawError;

/// Emulates the panel in the top-left corner of the host terminal.
///
/// Each glyph cell maps to one terminal cell, so `(x, y)` in pixels lands
/// on column `x / char_width`, row `y / char_height`. The rows below the
/// panel are left for the prompt.
pub struct TerminalSurface {
    out: Stdout,
    geometry: PanelGeometry,
}

impl TerminalSurface {
    pub fn new(geometry: PanelGeometry) -> io::Result<Self> {
        let mut out = io::stdout();
        execute!(out, Hide, Clear(ClearType::All), MoveTo(0, 0))?;
        Ok(Self { out, geometry })
    }

    /// First terminal row below the panel.
    pub fn prompt_row(&self) -> u16 {
        to_cell(self.geometry.rows() + 1)
    }

    fn cell(&self, x: u32, y: u32) -> (u16, u16) {
        (
            to_cell(x / self.geometry.char_width.max(1)),
            to_cell(y / self.geometry.char_height.max(1)),
        )
    }
}

fn to_cell(value: u32) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

impl DisplaySurface for TerminalSurface {
    fn draw_char(&mut self, x: u32, y: u32, ch: char, color: Rgb565) -> Result<(), DrawError> {
        if !self.geometry.contains(x, y) {
            return Err(DrawError::OutOfBounds { x, y });
        }
        let (col, row) = self.cell(x, y);
        let (r, g, b) = color.to_rgb();
        queue!(
            self.out,
            MoveTo(col, row),
            SetForegroundColor(Color::Rgb { r, g, b }),
            Print(ch),
            ResetColor
        )?;
        self.out.flush()?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DrawError> {
        let rows = self.geometry.rows() + 1;
        for row in 0..rows {
            queue!(self.out, MoveTo(0, to_cell(row)), Clear(ClearType::CurrentLine))?;
        }
        self.out.flush()?;
        Ok(())
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        let row = self.prompt_row().saturating_add(1);
        let _ = execute!(self.out, ResetColor, MoveTo(0, row), Show);
    }
}
