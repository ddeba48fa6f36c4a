use std::borrow::Cow;

use anyhow::Result;
use bytemuck::{Pod, Zeroable};

use crate::coords::{AffineTransform, Viewport};
use crate::paint::Color;
use crate::scene::SceneConfig;

use super::context::{DrawingContext, FlushReport};
use super::state::StateStack;

/// One recorded shape: NDC transform + fill color.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DrawInstance {
    /// Scene transform already composed with the viewport normalization.
    pub transform: AffineTransform,
    pub fill_color: Color,
}

/// Per-instance transform block as laid out in the storage buffer.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct InstanceTransform {
    /// `a, b, c, d, tx, ty`
    pub coefficients: [f32; 6],
}

/// Flattened buffers for a single submission.
///
/// Built from the pending instances at flush time and dropped right after.
#[derive(Debug, Clone)]
pub struct RenderBatch<'a> {
    /// Shared shape vertices, `(x, y, 0, 1)`, identical for every instance.
    pub positions: &'a [[f32; 4]],
    /// Fill color per instance.
    pub colors: Vec<[f32; 4]>,
    /// Transform block per instance.
    pub transforms: Vec<InstanceTransform>,
    /// WGSL program with `vs_main` / `fs_main` entry points.
    pub shader_source: &'a str,
}

impl<'a> RenderBatch<'a> {
    pub fn new(positions: &'a [[f32; 4]], instances: &[DrawInstance], shader_source: &'a str) -> Self {
        let (colors, transforms) = instances
            .iter()
            .map(|inst| {
                (
                    inst.fill_color.to_array(),
                    InstanceTransform {
                        coefficients: inst.transform.to_coefficients(),
                    },
                )
            })
            .unzip();

        Self {
            positions,
            colors,
            transforms,
            shader_source,
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.positions.len() as u32
    }

    #[inline]
    pub fn instance_count(&self) -> u32 {
        self.transforms.len() as u32
    }
}

/// Destination of a flushed batch.
///
/// Implementations encode exactly one instanced draw covering every instance.
/// Any error aborts the frame; the caller must not present it.
pub trait BatchTarget {
    fn submit(&mut self, batch: &RenderBatch<'_>) -> Result<()>;
}

/// GPU backend: records instances while the scene runs and submits them in a
/// single instanced draw on [`flush`](DrawingContext::flush).
///
/// A frame is `set_viewport` → scene calls → `flush`. Flushing always resets the
/// context, whether or not the submission succeeded.
pub struct BatchedContext {
    states: StateStack,
    pending: Vec<DrawInstance>,
    viewport: Option<Viewport>,
    normalization: AffineTransform,

    vertices: Vec<[f32; 4]>,
    shader_source: Cow<'static, str>,
}

impl BatchedContext {
    pub fn new(config: &SceneConfig) -> Self {
        let vertices: Vec<[f32; 4]> = config
            .shape
            .triangles()
            .into_iter()
            .map(|p| [p.x, p.y, 0.0, 1.0])
            .collect();
        if vertices.is_empty() {
            log::warn!("shape tessellates to zero triangles; batches will draw nothing");
        }

        Self {
            states: StateStack::new(),
            pending: Vec::new(),
            viewport: None,
            normalization: AffineTransform::identity(),
            vertices,
            shader_source: config.shader_source.clone(),
        }
    }

    /// Sets the drawable size used to normalize subsequently recorded shapes.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if !viewport.is_valid() {
            log::error!("ignoring invalid viewport {viewport:?}");
            debug_assert!(false, "invalid viewport {viewport:?}");
            return;
        }
        self.viewport = Some(viewport);
        self.normalization = viewport.normalization();
    }

    #[inline]
    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    /// Instances recorded since the last flush.
    #[inline]
    pub fn pending(&self) -> &[DrawInstance] {
        &self.pending
    }

    fn reset(&mut self) {
        self.pending.clear();
        self.states.reset();
    }
}

impl DrawingContext for BatchedContext {
    type Target<'t> = dyn BatchTarget + 't;

    #[inline]
    fn states(&self) -> &StateStack {
        &self.states
    }

    #[inline]
    fn states_mut(&mut self) -> &mut StateStack {
        &mut self.states
    }

    fn draw_debug_shape(&mut self) {
        if self.viewport.is_none() {
            log::error!("draw_debug_shape called before set_viewport; shape dropped");
            debug_assert!(false, "draw_debug_shape called before set_viewport");
            return;
        }

        let state = self.states.top();
        self.pending.push(DrawInstance {
            transform: state.ctm.concatenated(self.normalization),
            fill_color: state.fill_color,
        });
    }

    fn flush(&mut self, target: &mut Self::Target<'_>) -> Result<FlushReport> {
        let result = if self.pending.is_empty() || self.vertices.is_empty() {
            log::trace!("batched: nothing to submit");
            Ok(FlushReport::default())
        } else {
            let batch = RenderBatch::new(&self.vertices, &self.pending, &self.shader_source);
            let instances = batch.instance_count();
            target.submit(&batch).map(|()| {
                log::debug!(
                    "batched: 1 draw call, {instances} instances x {} vertices",
                    batch.vertex_count()
                );
                FlushReport { draw_calls: 1, instances }
            })
        };

        self.reset();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Vec2;
    use crate::scene::{DebugScene, ShapeGeometry};

    /// Records submitted batches instead of talking to a GPU.
    #[derive(Default)]
    struct RecordingTarget {
        draws: Vec<(u32, u32, Vec<InstanceTransform>, Vec<[f32; 4]>)>,
        fail: bool,
    }

    impl BatchTarget for RecordingTarget {
        fn submit(&mut self, batch: &RenderBatch<'_>) -> Result<()> {
            anyhow::ensure!(!self.fail, "pipeline creation failed");
            self.draws.push((
                batch.vertex_count(),
                batch.instance_count(),
                batch.transforms.clone(),
                batch.colors.clone(),
            ));
            Ok(())
        }
    }

    fn ctx() -> BatchedContext {
        let mut ctx = BatchedContext::new(&SceneConfig::default());
        ctx.set_viewport(Viewport::new(400.0, 300.0));
        ctx
    }

    #[test]
    fn draws_record_instead_of_rendering() {
        let mut ctx = ctx();
        for _ in 0..5 {
            ctx.draw_debug_shape();
        }
        assert_eq!(ctx.pending().len(), 5);
    }

    #[test]
    fn identity_instance_maps_origin_to_upper_left() {
        let mut ctx = ctx();
        ctx.draw_debug_shape();
        let t = ctx.pending()[0].transform;
        let p = t.apply(Vec2::zero());
        assert!((p.x + 1.0).abs() < 1e-6 && (p.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn instance_captures_state_at_draw_time() {
        let mut ctx = ctx();
        ctx.translate(100.0, 0.0);
        ctx.set_fill_color(&[0.5, 0.25]);
        ctx.draw_debug_shape();
        ctx.translate(50.0, 0.0);
        ctx.set_fill_color(&[1.0]);

        let inst = ctx.pending()[0];
        assert_eq!(inst.fill_color, Color::new(0.5, 0.25, 0.0, 1.0));
        let expected = AffineTransform::from_translation(100.0, 0.0)
            .concatenated(Viewport::new(400.0, 300.0).normalization());
        assert!(inst.transform.approx_eq(expected, 1e-6));
    }

    #[test]
    fn flush_submits_once_and_resets() {
        let mut ctx = ctx();
        let mut target = RecordingTarget::default();
        ctx.save_state();
        ctx.save_state();
        ctx.rotate(1.0);
        ctx.draw_debug_shape();
        ctx.draw_debug_shape();

        let report = ctx.flush(&mut target).unwrap();

        assert_eq!(report, FlushReport { draw_calls: 1, instances: 2 });
        assert_eq!(target.draws.len(), 1);
        assert!(ctx.pending().is_empty());
        assert_eq!(ctx.states().depth(), 1);
        assert_eq!(ctx.current_transform(), AffineTransform::identity());
    }

    #[test]
    fn scene_yields_single_draw_with_one_instance_per_shape() {
        let mut ctx = ctx();
        let mut target = RecordingTarget::default();
        DebugScene::default().draw(&mut ctx);
        ctx.flush(&mut target).unwrap();

        assert_eq!(target.draws.len(), 1);
        let (vertices, instances, transforms, colors) = &target.draws[0];
        assert_eq!(*instances, DebugScene::SHAPE_COUNT as u32);
        assert_eq!(*vertices, ShapeGeometry::debug_triangle().triangles().len() as u32);
        assert_eq!(colors[0], [1.0, 0.0, 0.0, 1.0]);
        assert_ne!(transforms[0], transforms[1]);
        assert_ne!(transforms[1], transforms[2]);
    }

    #[test]
    fn failed_submission_still_resets() {
        let mut ctx = ctx();
        let mut target = RecordingTarget { fail: true, ..Default::default() };
        ctx.save_state();
        ctx.draw_debug_shape();

        assert!(ctx.flush(&mut target).is_err());
        assert!(ctx.pending().is_empty());
        assert_eq!(ctx.states().depth(), 1);
    }

    #[test]
    fn empty_flush_skips_submission() {
        let mut ctx = ctx();
        let mut target = RecordingTarget::default();
        assert_eq!(ctx.flush(&mut target).unwrap(), FlushReport::default());
        assert!(target.draws.is_empty());
    }

    #[test]
    fn backends_agree_on_state() {
        use crate::render::ImmediateContext;

        let mut pixmap = tiny_skia::Pixmap::new(4, 4).unwrap();
        let mut cpu = ImmediateContext::new(pixmap.as_mut(), &SceneConfig::default());
        let mut gpu = ctx();

        fn script<C: DrawingContext + ?Sized>(c: &mut C) {
            c.concatenate(AffineTransform::from_scale(2.0, 2.0));
            c.translate(3.0, 1.0);
            c.save_state();
            c.rotate(0.4);
            c.set_fill_color(&[0.1, 0.2, 0.3]);
        }
        script(&mut cpu);
        script(&mut gpu);

        assert!(cpu.current_transform().approx_eq(gpu.current_transform(), 1e-6));
        assert_eq!(cpu.fill_color(), gpu.fill_color());
    }

    #[test]
    fn backends_agree_on_out_of_range_color() {
        use crate::render::ImmediateContext;

        let mut pixmap = tiny_skia::Pixmap::new(4, 4).unwrap();
        let mut cpu = ImmediateContext::new(pixmap.as_mut(), &SceneConfig::default());
        let mut gpu = ctx();
        let mut target = RecordingTarget::default();

        cpu.set_fill_color(&[1.0, 0.0, 0.0, 1.5]);
        gpu.set_fill_color(&[1.0, 0.0, 0.0, 1.5]);
        gpu.draw_debug_shape();
        gpu.flush(&mut target).unwrap();

        let uploaded = target.draws[0].3[0];
        let rasterized = cpu.fill_color().to_skia();
        assert_eq!(uploaded, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(uploaded[3], rasterized.alpha());
    }

    #[test]
    fn batch_flattens_in_instance_order() {
        let positions = [[0.0, 0.0, 0.0, 1.0]; 3];
        let instances = [
            DrawInstance {
                transform: AffineTransform::from_translation(1.0, 2.0),
                fill_color: Color::white(),
            },
            DrawInstance {
                transform: AffineTransform::from_scale(3.0, 4.0),
                fill_color: Color::black(),
            },
        ];
        let batch = RenderBatch::new(&positions, &instances, "");

        assert_eq!(batch.vertex_count(), 3);
        assert_eq!(batch.instance_count(), 2);
        assert_eq!(batch.transforms[0].coefficients, [1.0, 0.0, 0.0, 1.0, 1.0, 2.0]);
        assert_eq!(batch.colors[1], [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(std::mem::size_of::<InstanceTransform>(), 24);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "before set_viewport")]
    fn drawing_without_viewport_is_a_programmer_error() {
        let mut ctx = BatchedContext::new(&SceneConfig::default());
        ctx.draw_debug_shape();
    }
}
