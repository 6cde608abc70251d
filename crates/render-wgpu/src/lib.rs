//! wgpu render backend.
//!
//! Draws every visible drawable of a scene graph with a solid or wireframe
//! pipeline. GPU meshes are cached per drawable resource and dropped once the
//! resource leaves the scene.
//!
//! # Invariants
//! - Renderer never mutates scene or camera state.
//! - The backbuffer is the logical surface size times the pixel density.
//! - A lost or outdated surface is reconfigured and reported as
//!   `RenderError::SurfaceLost`; the frame is skipped, not failed.

mod gpu;
mod mesh;
mod shaders;

pub use gpu::{RenderedFrame, WgpuRenderer};
