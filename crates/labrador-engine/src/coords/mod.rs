//! Coordinate and geometry types shared by both drawing backends.
//!
//! Canonical scene space:
//! - pixels
//! - origin top-left
//! - +X right, +Y down
//!
//! The GPU backend maps scene space to normalized device coordinates with
//! [`Viewport::normalization`].

mod affine;
mod vec2;
mod viewport;

pub use affine::AffineTransform;
pub use vec2::Vec2;
pub use viewport::Viewport;
