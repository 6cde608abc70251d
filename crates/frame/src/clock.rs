use serde::Serialize;
use std::time::{Duration, Instant};

/// Upper bound on one tick's delta. A stall longer than this (debugger,
/// suspended window) is reported as this much time.
pub const MAX_DELTA: Duration = Duration::from_millis(100);

/// Timing for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameTime {
    /// Zero-based tick index since `start`.
    pub frame: u64,
    /// Time since the previous tick, clamped to [`MAX_DELTA`].
    pub delta: Duration,
    /// Time since `start`, unclamped.
    pub elapsed: Duration,
}

impl FrameTime {
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }
}

/// Monotonic clock fed explicit instants by the host.
#[derive(Debug, Clone)]
pub struct FrameClock {
    started: Instant,
    previous: Instant,
    frame: u64,
}

impl FrameClock {
    pub fn new(now: Instant) -> Self {
        Self {
            started: now,
            previous: now,
            frame: 0,
        }
    }

    pub fn reset(&mut self, now: Instant) {
        *self = Self::new(now);
    }

    /// Advance to `now`. An instant earlier than the previous one counts as
    /// zero elapsed time.
    pub fn tick(&mut self, now: Instant) -> FrameTime {
        let delta = now.saturating_duration_since(self.previous).min(MAX_DELTA);
        if now > self.previous {
            self.previous = now;
        }
        let time = FrameTime {
            frame: self.frame,
            delta,
            elapsed: self.previous.saturating_duration_since(self.started),
        };
        self.frame += 1;
        time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deltas_and_elapsed() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new(t0);
        let a = clock.tick(t0 + Duration::from_millis(16));
        let b = clock.tick(t0 + Duration::from_millis(33));
        assert_eq!(a.frame, 0);
        assert_eq!(a.delta, Duration::from_millis(16));
        assert_eq!(b.frame, 1);
        assert_eq!(b.delta, Duration::from_millis(17));
        assert_eq!(b.elapsed, Duration::from_millis(33));
    }

    #[test]
    fn stall_is_clamped() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new(t0);
        let t = clock.tick(t0 + Duration::from_secs(5));
        assert_eq!(t.delta, MAX_DELTA);
        assert_eq!(t.elapsed, Duration::from_secs(5));
    }

    #[test]
    fn time_never_runs_backwards() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new(t0 + Duration::from_millis(50));
        let t = clock.tick(t0);
        assert_eq!(t.delta, Duration::ZERO);
        assert_eq!(t.elapsed, Duration::ZERO);
    }
}
