//! Side-by-side playground for the two drawing backends.
//!
//! ```text
//! labrador-studio [triangle|rect|polyline] [cpu-snapshot.png]
//! ```
//!
//! The window shows the scene drawn by the batched GPU context. When a PNG
//! path is given, the same scene is also rasterized once by the immediate CPU
//! context at the first frame's drawable size (physical pixels, same as the
//! GPU viewport) and written to that file.

use anyhow::{Context, Result};
use labrador_engine::coords::Viewport;
use labrador_engine::core::{App, AppControl, FrameCtx};
use labrador_engine::device::GpuInit;
use labrador_engine::logging::{init_logging, LoggingConfig};
use labrador_engine::render::{BatchedContext, DrawingContext, ImmediateContext, WgpuBatchTarget};
use labrador_engine::scene::{DebugScene, SceneConfig, ShapeGeometry};
use labrador_engine::window::{Runtime, RuntimeConfig};

struct Studio {
    config: SceneConfig,
    scene: DebugScene,
    batched: BatchedContext,
    /// Pending CPU snapshot path; written once the drawable size is known.
    snapshot: Option<String>,
}

impl Studio {
    fn new(config: SceneConfig, snapshot: Option<String>) -> Self {
        let batched = BatchedContext::new(&config);
        Self {
            config,
            scene: DebugScene::default(),
            batched,
            snapshot,
        }
    }
}

impl App for Studio {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if !ctx.gpu.viewport().is_valid() {
            // Minimized; nothing to draw into.
            return AppControl::Continue;
        }

        if let Some(path) = self.snapshot.take() {
            let size = snapshot_size(ctx.gpu.viewport());
            if let Err(e) = write_cpu_snapshot(&self.config, &self.scene, size, &path) {
                log::error!("cpu snapshot failed: {e:#}");
            }
        }

        let (scene, batched) = (&self.scene, &mut self.batched);
        let frame_index = ctx.frame_index;

        ctx.render(self.config.clear_color, |rctx, target| {
            batched.set_viewport(rctx.viewport);
            scene.draw(&mut *batched);

            let mut sink = WgpuBatchTarget::new(rctx, target);
            let report = batched.flush(&mut sink)?;
            log::trace!(
                "frame {frame_index}: {} draw call(s), {} instance(s)",
                report.draw_calls,
                report.instances
            );
            Ok(())
        })
    }
}

fn shape_from_arg(arg: Option<&str>) -> Result<ShapeGeometry> {
    match arg {
        None | Some("triangle") => Ok(ShapeGeometry::debug_triangle()),
        Some("rect") => Ok(ShapeGeometry::filled_rect()),
        Some("polyline") => Ok(ShapeGeometry::polyline()),
        Some(other) => anyhow::bail!("unknown shape `{other}` (expected triangle, rect or polyline)"),
    }
}

/// Snapshot dimensions matching the GPU drawable.
fn snapshot_size(viewport: Viewport) -> (u32, u32) {
    (viewport.width.round() as u32, viewport.height.round() as u32)
}

fn write_cpu_snapshot(config: &SceneConfig, scene: &DebugScene, size: (u32, u32), path: &str) -> Result<()> {
    let mut pixmap = tiny_skia::Pixmap::new(size.0, size.1).context("invalid snapshot size")?;

    let raster_ops = {
        let mut cpu = ImmediateContext::new(pixmap.as_mut(), config);
        cpu.clear(config.clear_color);
        scene.draw(&mut cpu);
        cpu.flush(&mut ())?;
        cpu.raster_ops()
    };

    pixmap
        .save_png(path)
        .with_context(|| format!("failed to write {path}"))?;
    log::info!("cpu snapshot: {raster_ops} shape(s) -> {path}");
    Ok(())
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = SceneConfig::with_shape(shape_from_arg(args.first().map(String::as_str))?);

    let runtime = RuntimeConfig {
        title: "Labrador: batched GPU".to_string(),
        ..RuntimeConfig::default()
    };

    let snapshot = args.get(1).cloned();

    Runtime::run(runtime, GpuInit::default(), Studio::new(config, snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_matches_physical_drawable_size() {
        // 800x600 logical at a 2x scale factor.
        assert_eq!(snapshot_size(Viewport::new(1600.0, 1200.0)), (1600, 1200));
    }

    #[test]
    fn snapshot_png_has_requested_size() {
        let path = std::env::temp_dir().join("labrador-studio-snapshot-test.png");
        let path = path.to_str().unwrap();
        let config = SceneConfig::default();

        write_cpu_snapshot(&config, &DebugScene::default(), (64, 48), path).unwrap();

        let png = tiny_skia::Pixmap::load_png(path).unwrap();
        assert_eq!((png.width(), png.height()), (64, 48));
        let _ = std::fs::remove_file(path);
    }
}
