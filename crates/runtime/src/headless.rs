use crate::error::RuntimeError;
use crate::runtime::{SceneRuntime, Tick};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use vista_frame::FixedRateSync;
use vista_input::HostEvent;
use vista_render::{RenderBinding, Renderer};
use vista_viewport::{PresentationError, PresentationHost};

/// Presentation host with no display. Every fullscreen request fails.
#[derive(Debug, Default)]
pub struct NoPresentation;

impl PresentationHost for NoPresentation {
    fn is_fullscreen(&self) -> bool {
        false
    }

    fn request_fullscreen(&mut self) -> Result<(), PresentationError> {
        Err(PresentationError::Unsupported("headless".into()))
    }

    fn request_fullscreen_fallback(&mut self) -> Result<(), PresentationError> {
        Err(PresentationError::Unsupported("headless".into()))
    }

    fn exit_fullscreen(&mut self) -> Result<(), PresentationError> {
        Err(PresentationError::Unsupported("headless".into()))
    }

    fn exit_fullscreen_fallback(&mut self) -> Result<(), PresentationError> {
        Err(PresentationError::Unsupported("headless".into()))
    }
}

/// A resize delivered just before tick `at_tick`. Parses from `WxH@tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledResize {
    pub width: u32,
    pub height: u32,
    pub at_tick: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected WIDTHxHEIGHT@TICK, got `{0}`")]
pub struct ParseResizeError(String);

impl FromStr for ScheduledResize {
    type Err = ParseResizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ParseResizeError(s.to_string());
        let (size, tick) = s.split_once('@').ok_or_else(bad)?;
        let (w, h) = size.split_once(['x', 'X']).ok_or_else(bad)?;
        Ok(Self {
            width: w.trim().parse().map_err(|_| bad())?,
            height: h.trim().parse().map_err(|_| bad())?,
            at_tick: tick.trim().parse().map_err(|_| bad())?,
        })
    }
}

impl fmt::Display for ScheduledResize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}@{}", self.width, self.height, self.at_tick)
    }
}

/// Drive `runtime` for up to `ticks` ticks on a fixed-rate sync, calling
/// `on_tick` after each. Starts the loop if idle and stops it at the end.
///
/// Returns the number of ticks that ran, which is lower than `ticks` if the
/// loop was stopped from inside.
pub fn run_headless<R, F>(
    runtime: &mut SceneRuntime,
    render: &mut RenderBinding<R>,
    sync: &mut FixedRateSync,
    ticks: u64,
    resizes: &[ScheduledResize],
    mut on_tick: F,
) -> Result<u64, RuntimeError>
where
    R: Renderer,
    F: FnMut(&SceneRuntime, &Tick<R::Output>),
{
    if !runtime.frame_loop().is_running() {
        runtime.start(sync, Instant::now())?;
    }
    let mut host = NoPresentation;
    let mut completed = 0;
    while completed < ticks {
        for resize in resizes.iter().filter(|r| r.at_tick == completed) {
            let event = HostEvent::Resized {
                width: resize.width,
                height: resize.height,
            };
            runtime.handle_event(event, Instant::now(), &mut host);
        }
        let Some((ticket, now)) = sync.next_tick() else {
            break;
        };
        if let Some(tick) = runtime.on_frame(ticket, now, render, sync)? {
            completed += 1;
            on_tick(runtime, &tick);
        }
    }
    runtime.stop();
    tracing::info!(completed, requested = ticks, "headless run finished");
    Ok(completed)
}
