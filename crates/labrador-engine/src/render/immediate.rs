use anyhow::Result;
use tiny_skia::{FillRule, Paint, PixmapMut, Stroke};

use crate::paint::Color;
use crate::scene::{SceneConfig, ShapeStyle};

use super::context::{DrawingContext, FlushReport};
use super::state::StateStack;

/// CPU backend: every call takes effect on the borrowed pixmap before it returns.
///
/// Strokes are painted with the fill color; there is no separate stroke state.
pub struct ImmediateContext<'p> {
    pixmap: PixmapMut<'p>,
    path: Option<tiny_skia::Path>,
    style: ShapeStyle,
    states: StateStack,
    raster_ops: usize,
}

impl<'p> ImmediateContext<'p> {
    pub fn new(pixmap: PixmapMut<'p>, config: &SceneConfig) -> Self {
        let path = config.shape.to_skia_path();
        if path.is_none() {
            log::warn!("shape has fewer than two points; draw_debug_shape will be a no-op");
        }

        Self {
            pixmap,
            path,
            style: config.shape.style,
            states: StateStack::new(),
            raster_ops: 0,
        }
    }

    /// Fills the whole surface, ignoring the current transform.
    pub fn clear(&mut self, color: Color) {
        self.pixmap.fill(color.to_skia());
    }

    /// Shapes rasterized so far.
    #[inline]
    pub fn raster_ops(&self) -> usize {
        self.raster_ops
    }
}

impl DrawingContext for ImmediateContext<'_> {
    type Target<'t> = ();

    #[inline]
    fn states(&self) -> &StateStack {
        &self.states
    }

    #[inline]
    fn states_mut(&mut self) -> &mut StateStack {
        &mut self.states
    }

    fn draw_debug_shape(&mut self) {
        let Some(path) = self.path.as_ref() else { return };
        let state = self.states.top();

        let mut paint = Paint::default();
        paint.set_color(state.fill_color.to_skia());
        paint.anti_alias = true;

        let ts = state.ctm.to_skia();
        match self.style {
            ShapeStyle::Fill => {
                self.pixmap.fill_path(path, &paint, FillRule::Winding, ts, None);
            }
            ShapeStyle::Stroke { width, .. } => {
                let stroke = Stroke { width, ..Stroke::default() };
                self.pixmap.stroke_path(path, &paint, &stroke, ts, None);
            }
        }

        self.raster_ops += 1;
        log::trace!("immediate: rasterized shape #{}", self.raster_ops);
    }

    /// Nothing is deferred on this backend.
    fn flush(&mut self, _target: &mut Self::Target<'_>) -> Result<FlushReport> {
        Ok(FlushReport::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::AffineTransform;
    use crate::scene::{DebugScene, ShapeGeometry};
    use tiny_skia::Pixmap;

    fn rect_config() -> SceneConfig {
        SceneConfig::with_shape(ShapeGeometry::filled_rect())
    }

    #[test]
    fn draw_rasterizes_immediately_with_top_of_stack_state() {
        let mut pixmap = Pixmap::new(64, 64).unwrap();
        {
            let mut ctx = ImmediateContext::new(pixmap.as_mut(), &rect_config());
            ctx.translate(10.0, 10.0);
            ctx.set_fill_color(&[1.0, 0.0, 0.0, 1.0]);
            ctx.draw_debug_shape();
            assert_eq!(ctx.raster_ops(), 1);
        }

        let inside = pixmap.pixel(15, 15).unwrap();
        assert_eq!((inside.red(), inside.green(), inside.blue(), inside.alpha()), (255, 0, 0, 255));
        let outside = pixmap.pixel(5, 5).unwrap();
        assert_eq!(outside.alpha(), 0);
    }

    #[test]
    fn balanced_save_restore_round_trips() {
        let mut pixmap = Pixmap::new(8, 8).unwrap();
        let mut ctx = ImmediateContext::new(pixmap.as_mut(), &rect_config());
        ctx.translate(3.0, 4.0);
        ctx.set_fill_color(&[0.2, 0.4]);
        let (t0, c0) = (ctx.current_transform(), ctx.fill_color());

        ctx.save_state();
        ctx.rotate(0.5);
        ctx.save_state();
        ctx.scale(2.0, 3.0);
        ctx.set_fill_color(&[1.0, 1.0, 1.0]);
        ctx.restore_state();
        ctx.restore_state();

        assert!(ctx.current_transform().approx_eq(t0, 1e-6));
        assert_eq!(ctx.fill_color(), c0);
    }

    #[test]
    fn translate_then_restore_yields_snapshot() {
        let mut pixmap = Pixmap::new(8, 8).unwrap();
        let mut ctx = ImmediateContext::new(pixmap.as_mut(), &rect_config());
        ctx.concatenate(AffineTransform::from_rotation(0.3));
        let before = ctx.current_transform();

        ctx.save_state();
        ctx.translate(7.0, -2.0);
        ctx.restore_state();

        assert!(ctx.current_transform().approx_eq(before, f32::EPSILON));
    }

    #[test]
    fn malformed_color_degrades_to_black() {
        let mut pixmap = Pixmap::new(8, 8).unwrap();
        let mut ctx = ImmediateContext::new(pixmap.as_mut(), &rect_config());
        ctx.set_fill_color(&[1.0, 1.0, 1.0]);
        ctx.set_fill_color(&[f32::NAN, 0.0]);
        assert_eq!(ctx.fill_color(), Color::black());
    }

    #[test]
    fn scene_produces_one_raster_op_per_shape() {
        let mut pixmap = Pixmap::new(200, 200).unwrap();
        let mut ctx = ImmediateContext::new(pixmap.as_mut(), &SceneConfig::default());
        DebugScene::default().draw(&mut ctx);

        assert_eq!(ctx.raster_ops(), DebugScene::SHAPE_COUNT);
        assert_eq!(ctx.flush(&mut ()).unwrap(), FlushReport::default());
        assert_eq!(ctx.states().depth(), 1);
    }

    #[test]
    fn degenerate_shape_draws_nothing() {
        let config = SceneConfig::with_shape(ShapeGeometry::new(vec![], ShapeStyle::Fill));
        let mut pixmap = Pixmap::new(8, 8).unwrap();
        let mut ctx = ImmediateContext::new(pixmap.as_mut(), &config);
        ctx.draw_debug_shape();
        assert_eq!(ctx.raster_ops(), 0);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "without a matching save_state")]
    fn unbalanced_restore_panics_in_debug() {
        let mut pixmap = Pixmap::new(8, 8).unwrap();
        let mut ctx = ImmediateContext::new(pixmap.as_mut(), &rect_config());
        ctx.restore_state();
    }
}
