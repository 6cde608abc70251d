//! Rendering adapter: the renderer capability and the binding that keeps it
//! in step with the viewport.
//!
//! # Invariants
//! - A renderer reads the scene and camera; it never mutates them.
//! - Before every draw the binding has pushed the latest surface size and
//!   pixel density to the renderer.
//! - Surface loss is recoverable; every other draw failure is fatal.

mod binding;
mod renderer;

pub use binding::RenderBinding;
pub use renderer::{DebugTextRenderer, RenderError, Renderer, SurfaceInfo};
