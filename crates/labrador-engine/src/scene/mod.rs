//! Scene description shared by both backends.
//!
//! - `config`: shape geometry, shader source and clear color
//! - `script`: the backend-agnostic draw routine

mod config;
mod script;

pub use config::{SceneConfig, ShapeGeometry, ShapeStyle, DEFAULT_SHADER_SOURCE};
pub use script::DebugScene;
