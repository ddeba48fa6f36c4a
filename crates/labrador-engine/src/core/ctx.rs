use anyhow::Result;
use winit::window::{Window, WindowId};

use crate::device::{Gpu, SurfaceErrorAction};
use crate::paint::Color;
use crate::render::{RenderCtx, RenderTarget};
use crate::window::RuntimeCtx;

use super::app::AppControl;

/// Per-window handles.
pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

/// Per-frame context passed to `core::App::on_frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub frame_index: u64,
    pub runtime: &'a mut RuntimeCtx,
}

impl FrameCtx<'_, '_> {
    /// Acquires a drawable, clears it to `clear`, runs `draw`, then presents.
    ///
    /// If `draw` fails the frame is abandoned: the error is logged and nothing
    /// is presented. Drawable acquisition failures are mapped through
    /// [`Gpu::handle_surface_error`]; only fatal ones stop the app.
    pub fn render<F>(&mut self, clear: Color, draw: F) -> AppControl
    where
        F: FnOnce(&RenderCtx<'_>, &mut RenderTarget<'_>) -> Result<()>,
    {
        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                log::warn!("frame {}: no drawable ({err})", self.frame_index);
                return match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => AppControl::Exit,
                    _ => AppControl::Continue,
                };
            }
        };

        // Clear pass; dropped before the encoder is borrowed by the target.
        {
            let _rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("labrador clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear.to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        let rctx = RenderCtx::new(self.gpu.device(), self.gpu.surface_format(), self.gpu.viewport());

        let drawn = {
            let mut target = RenderTarget::new(&mut frame.encoder, &frame.view);
            draw(&rctx, &mut target)
        };

        if let Err(e) = drawn {
            log::error!("frame {} abandoned: {e:#}", self.frame_index);
            return AppControl::Continue;
        }

        self.window.window.pre_present_notify();
        self.gpu.present(frame);

        AppControl::Continue
    }
}
