//! Fill color model shared by both drawing backends.
//!
//! Colors are straight (non-premultiplied) RGBA in `[0, 1]`. The CPU rasterizer
//! premultiplies internally; the GPU pipeline blends with straight alpha.

pub mod color;

pub use color::{Color, ColorError};
