//! Frame Loop: a cooperative single-threaded scheduler driven by a display
//! synchronisation primitive.
//!
//! # Invariants
//! - States move Idle → Scheduled → Running → Scheduled, or back to Idle on
//!   stop or fatal error.
//! - At most one tick is outstanding. A ticket that is not the outstanding
//!   one (stale, duplicated, or issued before a stop) does nothing.
//! - The loop never recurses and never spawns threads; the host calls back
//!   into it once per display refresh.

mod clock;
mod frame_loop;
mod sync;
mod timer;

pub use clock::{FrameClock, FrameTime, MAX_DELTA};
pub use frame_loop::{FrameLoop, LoopError, LoopState, StopHandle, TickTicket};
pub use sync::{DisplaySync, FixedRateSync};
pub use timer::FrameTimer;
