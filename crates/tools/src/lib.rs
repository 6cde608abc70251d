//! Developer tooling: read-only inspection of a running scene runtime.
//!
//! # Invariants
//! - Inspection never mutates runtime state.

mod inspector;

pub use inspector::{BindingInfo, DrawableInfo, NodeInfo, RuntimeSummary, SceneInspector};
