use anyhow::Result;

use crate::coords::AffineTransform;
use crate::paint::Color;

use super::state::{restore_or_report, StateStack};

/// Outcome of a successful [`DrawingContext::flush`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Draw calls issued to the target.
    pub draw_calls: u32,
    /// Instances covered by those draw calls.
    pub instances: u32,
}

/// Drawing API shared by the immediate (CPU) and batched (GPU) backends.
///
/// Transform and fill-color state live in a [`StateStack`] owned by the
/// implementor. Every transform operation rewrites the top-of-stack entry, so
/// save/restore behaves identically on both backends; only
/// [`draw_debug_shape`](Self::draw_debug_shape) and [`flush`](Self::flush)
/// differ.
pub trait DrawingContext {
    /// Surface handed to [`flush`](Self::flush), borrowed for one call.
    type Target<'t>: ?Sized;

    fn states(&self) -> &StateStack;
    fn states_mut(&mut self) -> &mut StateStack;

    #[inline]
    fn current_transform(&self) -> AffineTransform {
        self.states().top().ctm
    }

    #[inline]
    fn fill_color(&self) -> Color {
        self.states().top().fill_color
    }

    fn rotate(&mut self, radians: f32) {
        self.states_mut().map_ctm(|ctm| ctm.rotated(radians));
    }

    fn scale(&mut self, sx: f32, sy: f32) {
        self.states_mut().map_ctm(|ctm| ctm.scaled(sx, sy));
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.states_mut().map_ctm(|ctm| ctm.translated(dx, dy));
    }

    /// Prepends `transform` in local space (`transform`, then current).
    fn concatenate(&mut self, transform: AffineTransform) {
        self.states_mut().map_ctm(|ctm| transform.concatenated(ctm));
    }

    fn save_state(&mut self) {
        self.states_mut().save();
    }

    /// Pops the last saved state. Unbalanced calls are a programmer error:
    /// debug builds panic, release builds log and ignore.
    fn restore_state(&mut self) {
        restore_or_report(self.states_mut());
    }

    /// Sets the fill color from up to four `R, G, B, A` components.
    ///
    /// Malformed input degrades to opaque black.
    fn set_fill_color(&mut self, components: &[f32]) {
        self.states_mut().top_mut().fill_color = Color::from_components_or_black(components);
    }

    /// Draws the configured shape with the current transform and fill color.
    fn draw_debug_shape(&mut self);

    /// Hands pending work to `target`.
    fn flush(&mut self, target: &mut Self::Target<'_>) -> Result<FlushReport>;
}
