//! Scene Runtime: the context object that owns viewport, camera, scene,
//! bindings and frame loop, and runs the ordered tick.
//!
//! # Invariants
//! - Each tick runs: clock, binding mutations, animations, camera pose and
//!   projection, surface sync and draw, reschedule. Nothing else writes
//!   render state.
//! - A viewport change reaches the camera projection on the next tick, never
//!   earlier and never later.
//! - A geometry commit rebuilds once; a failed rebuild leaves the previous
//!   resource installed and the loop running.
//! - A fatal draw error idles the loop and is returned to the caller.

mod animation;
mod config;
mod error;
mod headless;
pub mod presets;
mod runtime;
mod target;

pub use animation::{Animator, Motion};
pub use config::{
    CameraConfig, CameraModeKind, ConfigError, FrameConfig, ProjectionKind, RenderConfig,
    RuntimeConfig, SceneConfig, ScenePreset, WindowConfig,
};
pub use error::RuntimeError;
pub use headless::{NoPresentation, ParseResizeError, ScheduledResize, run_headless};
pub use presets::InstalledPreset;
pub use runtime::{SceneRuntime, Tick, TickReport};
pub use target::{FieldError, SceneTarget, StagedGeometry};
