//! Shared types used across the vista scene runtime crates.

mod types;

pub use types::{Axis, NodeId, Transform, ViewportSize};
