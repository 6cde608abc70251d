use crate::frame_loop::TickTicket;
use std::time::{Duration, Instant};

/// Display synchronisation primitive.
///
/// The frame loop asks for one tick at a time; the host delivers the ticket
/// back to `FrameLoop::begin_tick` at the next refresh.
pub trait DisplaySync {
    fn request_frame(&mut self, ticket: TickTicket);
}

/// Fixed-interval sync for hosts without a display (CLI, tests).
///
/// Holds at most one pending ticket. `next_tick` sleeps until the next
/// deadline on the calling thread.
#[derive(Debug)]
pub struct FixedRateSync {
    interval: Duration,
    next_deadline: Option<Instant>,
    pending: Option<TickTicket>,
    requests: u64,
}

impl FixedRateSync {
    /// `fps == 0` ticks as fast as the caller pumps.
    pub fn new(fps: u32) -> Self {
        let interval = if fps == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs(1) / fps
        };
        Self {
            interval,
            next_deadline: None,
            pending: None,
            requests: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn requests(&self) -> u64 {
        self.requests
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending ticket without waiting.
    pub fn take_pending(&mut self) -> Option<TickTicket> {
        self.pending.take()
    }

    /// Wait for the next deadline and hand back the pending ticket along with
    /// the instant it fires at. `None` when nothing was requested.
    pub fn next_tick(&mut self) -> Option<(TickTicket, Instant)> {
        let ticket = self.pending.take()?;
        let now = Instant::now();
        let deadline = self.next_deadline.unwrap_or(now);
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
        let fired = Instant::now();
        // fall behind rather than burst when a tick overran
        self.next_deadline = Some(deadline.max(fired) + self.interval);
        Some((ticket, fired))
    }
}

impl DisplaySync for FixedRateSync {
    fn request_frame(&mut self, ticket: TickTicket) {
        self.requests += 1;
        if self.pending.replace(ticket).is_some() {
            tracing::trace!("pending tick superseded");
        }
    }
}
