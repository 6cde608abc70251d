//! Input mapping: raw host surface events become high-level [`Action`]s.
//!
//! # Invariants
//! - The runtime consumes actions, never raw host events, so every host
//!   (windowed or headless) drives the same logic.
//! - Pointer positions are normalised against the most recent resize.

pub mod action;
pub mod mapper;

pub use action::{Action, normalize_pointer};
pub use mapper::{DOUBLE_CLICK_SLOP, DOUBLE_CLICK_WINDOW, HostEvent, InputMapper, Key, PointerButton};
