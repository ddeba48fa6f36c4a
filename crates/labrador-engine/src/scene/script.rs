use crate::coords::AffineTransform;
use crate::render::DrawingContext;

/// Backend-agnostic scene: the same call sequence runs against either context.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DebugScene {
    /// Placement of the whole scene; applied before anything else.
    pub base: AffineTransform,
}

impl Default for DebugScene {
    fn default() -> Self {
        Self {
            base: AffineTransform::from_translation(50.0, 50.0).scaled(4.0, 4.0),
        }
    }
}

impl DebugScene {
    /// Shapes drawn by one [`draw`](Self::draw) call.
    pub const SHAPE_COUNT: usize = 3;

    /// Runs the scene. Leaves the context's state as it found it.
    pub fn draw<C>(&self, ctx: &mut C)
    where
        C: DrawingContext + ?Sized,
    {
        ctx.save_state();
        ctx.concatenate(self.base);

        ctx.set_fill_color(&[1.0, 0.0, 0.0]);
        ctx.draw_debug_shape();

        ctx.translate(5.0, 5.0);
        ctx.rotate(0.2);
        ctx.set_fill_color(&[0.0, 0.6, 0.0]);
        ctx.draw_debug_shape();

        ctx.save_state();
        ctx.translate(20.0, 0.0);
        ctx.scale(0.5, 0.5);
        ctx.set_fill_color(&[0.0, 0.0, 1.0, 0.8]);
        ctx.draw_debug_shape();
        ctx.restore_state();

        ctx.restore_state();
    }
}
