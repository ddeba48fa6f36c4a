//! Drawing contexts.
//!
//! Two backends behind one [`DrawingContext`] trait:
//! - [`ImmediateContext`]: rasterizes each shape on the CPU as it is drawn
//! - [`BatchedContext`]: records instances and submits them to the GPU as one
//!   instanced draw on flush
//!
//! Convention:
//! - scene geometry is in pixels (top-left origin, +Y down)
//! - the batched backend normalizes to NDC on the CPU before upload

mod batched;
mod context;
mod ctx;
mod immediate;
mod state;
mod wgpu_target;

pub use batched::{BatchTarget, BatchedContext, DrawInstance, InstanceTransform, RenderBatch};
pub use context::{DrawingContext, FlushReport};
pub use ctx::{RenderCtx, RenderTarget};
pub use immediate::ImmediateContext;
pub use state::{GraphicsState, StateError, StateStack};
pub use wgpu_target::{validate_wgsl, WgpuBatchTarget};
