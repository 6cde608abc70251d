//! Camera Rig: projection parameters and pose, driven by viewport changes and
//! pointer input.
//!
//! # Invariants
//! - `0 < near < far` at all times; rejected updates keep the last good pair.
//! - The aspect ratio comes from the viewport passed to the most recent
//!   [`CameraRig::update_projection`]; nothing else changes it.
//! - A rig runs exactly one interaction mode, fixed at construction.

mod controls;
mod rig;

pub use controls::{CursorFollow, InputSample, OrbitControls};
pub use rig::{CameraError, CameraMode, CameraRig, Pose, Projection};
