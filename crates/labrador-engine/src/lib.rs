//! Labrador engine crate.
//!
//! Two interchangeable drawing backends behind one [`render::DrawingContext`]
//! trait: a CPU rasterizer that draws immediately and a GPU context that
//! batches every shape of a frame into a single instanced draw. The `device`,
//! `window` and `core` modules host the wgpu/winit plumbing the GPU backend
//! runs on.

pub mod coords;
pub mod core;
pub mod device;
pub mod logging;
pub mod paint;
pub mod render;
pub mod scene;
pub mod window;
