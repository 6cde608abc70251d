use crate::config::ConfigError;
use vista_bindings::BindingError;
use vista_frame::LoopError;
use vista_render::RenderError;
use vista_scene::{GeometryError, SceneError};

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Loop(#[from] LoopError),
    /// A fatal draw error. The frame loop is already idle when this surfaces.
    #[error("render failed: {0}")]
    Render(#[from] RenderError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Binding(#[from] BindingError),
}
