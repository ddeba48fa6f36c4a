//! Core engine-facing contracts.
//!
//! The stable interface between the runtime (platform loop) and the
//! application driving the drawing contexts.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
