//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating & configuring the Surface (swapchain)
//! - acquiring drawables and presenting them
//!
//! A missing adapter or device is reported as an error, never a panic.

mod gpu;
mod init;
mod surface;

pub use gpu::{Gpu, GpuFrame, SurfaceErrorAction};
pub use init::GpuInit;
