//! Live Parameter Bindings: external controls mutate scene, material and
//! camera fields through an explicit mutation queue.
//!
//! # Invariants
//! - An applied value always lies in `[min, max]` and, when such a value
//!   exists, is a multiple of the binding's step.
//! - Control input never writes render state directly. It stages a
//!   [`Mutation`] that the frame loop applies at a fixed point in the tick.
//! - Expensive work (geometry rebuild) happens only on commit, once per commit.

mod field;
mod registry;

pub use field::{FieldRef, MaterialField};
pub use registry::{
    ApplyReport, BindingError, BindingId, BindingRegistry, BindingTarget, Mutation, TunableBinding,
    quantize,
};
