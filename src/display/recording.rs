use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{DisplaySurface, Rgb565};
use crate::error::DrawError;

/// One call made against a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawOp {
    Char { x: u32, y: u32, ch: char },
    Clear,
}

/// In-memory surface that records every call.
///
/// Clones share the log, so a test can keep one clone while the pager
/// owns the other. Characters registered with [`fail_on`](Self::fail_on)
/// are rejected with [`DrawError::Device`] and not recorded.
#[derive(Clone, Default)]
pub struct RecordingSurface {
    ops: Arc<Mutex<Vec<DrawOp>>>,
    failing: Arc<Mutex<HashSet<char>>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&self, ch: char) {
        self.failing.lock().insert(ch);
    }

    pub fn ops(&self) -> Vec<DrawOp> {
        self.ops.lock().clone()
    }

    /// Drawn characters in order, ignoring positions and clears.
    pub fn text(&self) -> String {
        self.ops
            .lock()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Char { ch, .. } => Some(*ch),
                DrawOp::Clear => None,
            })
            .collect()
    }

    pub fn clears(&self) -> usize {
        self.ops
            .lock()
            .iter()
            .filter(|op| matches!(op, DrawOp::Clear))
            .count()
    }
}

impl DisplaySurface for RecordingSurface {
    fn draw_char(&mut self, x: u32, y: u32, ch: char, _color: Rgb565) -> Result<(), DrawError> {
        if self.failing.lock().contains(&ch) {
            return Err(DrawError::Device(format!("glyph {ch:?} rejected")));
        }
        self.ops.lock().push(DrawOp::Char { x, y, ch });
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DrawError> {
        self.ops.lock().push(DrawOp::Clear);
        Ok(())
    }
}
