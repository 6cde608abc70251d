use crate::clock::{FrameClock, FrameTime};
use crate::sync::DisplaySync;
use crate::timer::FrameTimer;
use serde::Serialize;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoopState {
    Idle,
    /// A tick has been requested from the display sync and not yet delivered.
    Scheduled,
    /// Inside a tick, between `begin_tick` and `end_tick`.
    Running,
}

#[derive(Debug, thiserror::Error)]
pub enum LoopError {
    #[error("frame loop already started ({0:?})")]
    AlreadyStarted(LoopState),
}

/// Token the display sync hands back when it is time to tick.
///
/// Only the most recently issued ticket is honoured; any other is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TickTicket {
    generation: u64,
    sequence: u64,
}

impl TickTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Requests a stop from code that cannot borrow the loop, such as a
/// callback running inside a tick. Honoured at the end of the current tick.
#[derive(Debug, Clone)]
pub struct StopHandle(Rc<Cell<bool>>);

impl StopHandle {
    pub fn request_stop(&self) {
        self.0.set(true);
    }

    pub fn is_requested(&self) -> bool {
        self.0.get()
    }
}

/// Idle → Scheduled → Running → Scheduled state machine.
#[derive(Debug)]
pub struct FrameLoop {
    state: LoopState,
    generation: u64,
    sequence: u64,
    outstanding: Option<TickTicket>,
    stop_flag: Rc<Cell<bool>>,
    clock: Option<FrameClock>,
    tick_started: Option<Instant>,
    timer: FrameTimer,
    ticks: u64,
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameLoop {
    pub fn new() -> Self {
        Self {
            state: LoopState::Idle,
            generation: 0,
            sequence: 0,
            outstanding: None,
            stop_flag: Rc::new(Cell::new(false)),
            clock: None,
            tick_started: None,
            timer: FrameTimer::new(120),
            ticks: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state != LoopState::Idle
    }

    /// Ticks completed across all runs.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Wall time spent between `begin_tick` and `end_tick`.
    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    /// Handle for the current run. A fresh `start` issues a new flag, so
    /// handles from a previous run cannot stop the next one.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Rc::clone(&self.stop_flag))
    }

    /// Idle → Scheduled. Requests the first tick.
    pub fn start(&mut self, sync: &mut dyn DisplaySync, now: Instant) -> Result<(), LoopError> {
        if self.state != LoopState::Idle {
            return Err(LoopError::AlreadyStarted(self.state));
        }
        self.generation += 1;
        self.stop_flag = Rc::new(Cell::new(false));
        self.clock = Some(FrameClock::new(now));
        self.state = LoopState::Scheduled;
        tracing::info!(generation = self.generation, "frame loop started");
        self.schedule(sync);
        Ok(())
    }

    /// Any state → Idle. A tick already requested from the display sync
    /// becomes a no-op when it fires.
    pub fn stop(&mut self) {
        if self.state == LoopState::Idle {
            return;
        }
        tracing::info!(generation = self.generation, ticks = self.ticks, "frame loop stopped");
        self.state = LoopState::Idle;
        self.outstanding = None;
    }

    /// Fatal error inside a tick. Same as `stop`, logged as an error.
    pub fn fail(&mut self, reason: &str) {
        tracing::error!(generation = self.generation, reason, "frame loop halted");
        self.state = LoopState::Idle;
        self.outstanding = None;
    }

    /// Scheduled → Running. `None` when the ticket is not the outstanding one.
    pub fn begin_tick(&mut self, ticket: TickTicket, now: Instant) -> Option<FrameTime> {
        if self.state != LoopState::Scheduled || self.outstanding != Some(ticket) {
            tracing::trace!(?ticket, state = ?self.state, "stale tick ignored");
            return None;
        }
        let clock = self.clock.as_mut()?;
        self.outstanding = None;
        self.state = LoopState::Running;
        self.tick_started = Some(Instant::now());
        Some(clock.tick(now))
    }

    /// Running → Scheduled, or → Idle if a stop was requested during the
    /// tick. Returns whether another tick was requested.
    pub fn end_tick(&mut self, sync: &mut dyn DisplaySync) -> bool {
        if let Some(started) = self.tick_started.take() {
            self.timer.record(started.elapsed());
            self.ticks += 1;
        }
        if self.state != LoopState::Running {
            return false;
        }
        if self.stop_flag.get() {
            self.stop();
            return false;
        }
        self.state = LoopState::Scheduled;
        self.schedule(sync);
        true
    }

    fn schedule(&mut self, sync: &mut dyn DisplaySync) {
        self.sequence += 1;
        let ticket = TickTicket {
            generation: self.generation,
            sequence: self.sequence,
        };
        self.outstanding = Some(ticket);
        sync.request_frame(ticket);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Queue(Vec<TickTicket>);

    impl DisplaySync for Queue {
        fn request_frame(&mut self, ticket: TickTicket) {
            self.0.push(ticket);
        }
    }

    /// Deliver queued tickets in order, counting the ticks that run.
    fn pump(frame_loop: &mut FrameLoop, sync: &mut Queue, max: usize) -> usize {
        let mut draws = 0;
        for _ in 0..max {
            if sync.0.is_empty() {
                break;
            }
            let ticket = sync.0.remove(0);
            if frame_loop.begin_tick(ticket, Instant::now()).is_some() {
                draws += 1;
                frame_loop.end_tick(sync);
            }
        }
        draws
    }

    #[test]
    fn start_schedules_one_tick() {
        let mut fl = FrameLoop::new();
        let mut sync = Queue::default();
        assert_eq!(fl.state(), LoopState::Idle);
        fl.start(&mut sync, Instant::now()).unwrap();
        assert_eq!(fl.state(), LoopState::Scheduled);
        assert_eq!(sync.0.len(), 1);

        let t = fl.begin_tick(sync.0[0], Instant::now()).unwrap();
        assert_eq!(t.frame, 0);
        assert_eq!(fl.state(), LoopState::Running);
        assert!(fl.end_tick(&mut sync));
        assert_eq!(fl.state(), LoopState::Scheduled);
        assert_eq!(sync.0.len(), 2);
        assert_eq!(fl.ticks(), 1);
    }

    #[test]
    fn start_twice_is_an_error() {
        let mut fl = FrameLoop::new();
        let mut sync = Queue::default();
        fl.start(&mut sync, Instant::now()).unwrap();
        assert!(matches!(
            fl.start(&mut sync, Instant::now()),
            Err(LoopError::AlreadyStarted(LoopState::Scheduled))
        ));
        assert_eq!(sync.0.len(), 1);
    }

    #[test]
    fn stop_before_first_tick_draws_nothing() {
        let mut fl = FrameLoop::new();
        let mut sync = Queue::default();
        fl.start(&mut sync, Instant::now()).unwrap();
        fl.stop();
        assert_eq!(pump(&mut fl, &mut sync, 10), 0);
        assert_eq!(fl.state(), LoopState::Idle);
        assert_eq!(fl.ticks(), 0);
    }

    #[test]
    fn stale_ticket_after_restart_is_ignored() {
        let mut fl = FrameLoop::new();
        let mut sync = Queue::default();
        fl.start(&mut sync, Instant::now()).unwrap();
        let old = sync.0[0];
        fl.stop();
        fl.start(&mut sync, Instant::now()).unwrap();
        assert!(fl.begin_tick(old, Instant::now()).is_none());
        assert_eq!(fl.state(), LoopState::Scheduled);
        let fresh = sync.0[1];
        assert_ne!(old.generation(), fresh.generation());
        assert!(fl.begin_tick(fresh, Instant::now()).is_some());
    }

    #[test]
    fn duplicate_delivery_runs_once() {
        let mut fl = FrameLoop::new();
        let mut sync = Queue::default();
        fl.start(&mut sync, Instant::now()).unwrap();
        let ticket = sync.0[0];
        assert!(fl.begin_tick(ticket, Instant::now()).is_some());
        assert!(fl.begin_tick(ticket, Instant::now()).is_none());
        fl.end_tick(&mut sync);
        assert!(fl.begin_tick(ticket, Instant::now()).is_none());
    }

    #[test]
    fn stop_handle_honoured_at_end_of_tick() {
        let mut fl = FrameLoop::new();
        let mut sync = Queue::default();
        fl.start(&mut sync, Instant::now()).unwrap();
        let handle = fl.stop_handle();
        let ticket = sync.0.remove(0);
        fl.begin_tick(ticket, Instant::now()).unwrap();
        handle.request_stop();
        assert_eq!(fl.state(), LoopState::Running);
        assert!(!fl.end_tick(&mut sync));
        assert_eq!(fl.state(), LoopState::Idle);
        assert!(sync.0.is_empty());
    }

    #[test]
    fn old_stop_handle_does_not_stop_new_run() {
        let mut fl = FrameLoop::new();
        let mut sync = Queue::default();
        fl.start(&mut sync, Instant::now()).unwrap();
        let old = fl.stop_handle();
        fl.stop();
        sync.0.clear();
        fl.start(&mut sync, Instant::now()).unwrap();
        old.request_stop();
        assert_eq!(pump(&mut fl, &mut sync, 3), 3);
        assert!(fl.is_running());
    }

    #[test]
    fn fail_mid_tick_goes_idle() {
        let mut fl = FrameLoop::new();
        let mut sync = Queue::default();
        fl.start(&mut sync, Instant::now()).unwrap();
        let ticket = sync.0.remove(0);
        fl.begin_tick(ticket, Instant::now()).unwrap();
        fl.fail("device lost");
        assert!(!fl.end_tick(&mut sync));
        assert_eq!(fl.state(), LoopState::Idle);
        assert!(sync.0.is_empty());
        assert_eq!(fl.ticks(), 1);
    }

    #[test]
    fn runs_continuously() {
        let mut fl = FrameLoop::new();
        let mut sync = Queue::default();
        fl.start(&mut sync, Instant::now()).unwrap();
        assert_eq!(pump(&mut fl, &mut sync, 5), 5);
        assert_eq!(fl.ticks(), 5);
        assert_eq!(fl.timer().count(), 5);
    }
}
