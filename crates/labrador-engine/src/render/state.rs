use std::fmt;

use crate::coords::AffineTransform;
use crate::paint::Color;

/// Transform + fill color pair saved and restored as a unit.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GraphicsState {
    pub ctm: AffineTransform,
    pub fill_color: Color,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: AffineTransform::identity(),
            fill_color: Color::black(),
        }
    }
}

/// Returned when a restore would pop the bottom entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StateError;

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("restore_state called without a matching save_state")
    }
}

impl std::error::Error for StateError {}

/// Save/restore stack of [`GraphicsState`].
///
/// Invariant: never empty. The bottom entry is the initial state and can only
/// be replaced by [`reset`](Self::reset).
#[derive(Debug, Clone)]
pub struct StateStack {
    entries: Vec<GraphicsState>,
}

impl Default for StateStack {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStack {
    pub fn new() -> Self {
        Self {
            entries: vec![GraphicsState::default()],
        }
    }

    #[inline]
    pub fn top(&self) -> &GraphicsState {
        // Non-empty by construction.
        &self.entries[self.entries.len() - 1]
    }

    #[inline]
    pub fn top_mut(&mut self) -> &mut GraphicsState {
        let last = self.entries.len() - 1;
        &mut self.entries[last]
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    /// Pushes a copy of the current top.
    pub fn save(&mut self) {
        let top = *self.top();
        self.entries.push(top);
    }

    /// Pops the current top, refusing to pop the bottom entry.
    pub fn restore(&mut self) -> Result<(), StateError> {
        if self.entries.len() <= 1 {
            return Err(StateError);
        }
        self.entries.pop();
        Ok(())
    }

    /// Drops everything back to the single initial entry.
    pub fn reset(&mut self) {
        self.entries.truncate(1);
        self.entries[0] = GraphicsState::default();
    }

    /// Replaces the top transform with `f(top)`.
    #[inline]
    pub fn map_ctm(&mut self, f: impl FnOnce(AffineTransform) -> AffineTransform) {
        let top = self.top_mut();
        top.ctm = f(top.ctm);
    }
}

/// Shared guard for `restore_state` on both contexts.
pub(crate) fn restore_or_report(stack: &mut StateStack) {
    if let Err(e) = stack.restore() {
        log::error!("{e}");
        debug_assert!(false, "{e}");
    }
}
