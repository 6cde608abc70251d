//! Viewport Tracker and Fullscreen/Resize Coordinator.
//!
//! # Invariants
//! - The tracked size is never zero on either axis.
//! - The tracker is inert: a resize only raises dirty flags that the frame
//!   loop consumes on its next tick.
//! - Fullscreen toggling never fails from the caller's point of view and never
//!   touches the viewport; the host's resize notification does that.

mod fullscreen;
mod tracker;

pub use fullscreen::{FullscreenCoordinator, FullscreenOutcome, PresentationError, PresentationHost};
pub use tracker::{DEFAULT_MAX_PIXEL_RATIO, ViewportTracker};
