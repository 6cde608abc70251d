use std::sync::Arc;
use vista_frame::{DisplaySync, TickTicket};
use vista_input::{HostEvent, Key, PointerButton};
use vista_viewport::{PresentationError, PresentationHost};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{Key as WinitKey, NamedKey};
use winit::window::{Fullscreen, Window};

/// Pixels per wheel line for touchpads reporting pixel deltas.
const PIXELS_PER_LINE: f64 = 40.0;

/// Display sync backed by the window's redraw requests.
///
/// The frame loop's ticket is parked here until winit delivers
/// `RedrawRequested`.
pub struct RedrawSync {
    window: Arc<Window>,
    pending: Option<TickTicket>,
}

impl RedrawSync {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn take_pending(&mut self) -> Option<TickTicket> {
        self.pending.take()
    }
}

impl DisplaySync for RedrawSync {
    fn request_frame(&mut self, ticket: TickTicket) {
        self.pending = Some(ticket);
        self.window.request_redraw();
    }
}

/// Fullscreen through winit: borderless first, exclusive video mode as the
/// fallback.
pub struct WindowPresentation<'a> {
    window: &'a Window,
}

impl<'a> WindowPresentation<'a> {
    pub fn new(window: &'a Window) -> Self {
        Self { window }
    }
}

impl PresentationHost for WindowPresentation<'_> {
    fn is_fullscreen(&self) -> bool {
        self.window.fullscreen().is_some()
    }

    fn request_fullscreen(&mut self) -> Result<(), PresentationError> {
        let monitor = self
            .window
            .current_monitor()
            .ok_or_else(|| PresentationError::Unsupported("no current monitor".into()))?;
        self.window
            .set_fullscreen(Some(Fullscreen::Borderless(Some(monitor))));
        Ok(())
    }

    fn request_fullscreen_fallback(&mut self) -> Result<(), PresentationError> {
        let mode = self
            .window
            .current_monitor()
            .and_then(|m| m.video_modes().next())
            .ok_or_else(|| PresentationError::Unsupported("no exclusive video mode".into()))?;
        self.window.set_fullscreen(Some(Fullscreen::Exclusive(mode)));
        Ok(())
    }

    fn exit_fullscreen(&mut self) -> Result<(), PresentationError> {
        if self.window.fullscreen().is_none() {
            return Err(PresentationError::Rejected("not fullscreen".into()));
        }
        self.window.set_fullscreen(None);
        Ok(())
    }

    fn exit_fullscreen_fallback(&mut self) -> Result<(), PresentationError> {
        Err(PresentationError::Unsupported("no fallback exit".into()))
    }
}

/// Translate a winit window event into the runtime's host event, in logical
/// pixels.
pub fn host_event(event: &WindowEvent, scale_factor: f64) -> Option<HostEvent> {
    match event {
        WindowEvent::Resized(size) => {
            let logical = size.to_logical::<f64>(scale_factor);
            Some(HostEvent::Resized {
                width: logical.width.round() as u32,
                height: logical.height.round() as u32,
            })
        }
        WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
            Some(HostEvent::ScaleFactorChanged(*scale_factor))
        }
        WindowEvent::CursorMoved { position, .. } => {
            let logical = position.to_logical::<f32>(scale_factor);
            Some(HostEvent::PointerMoved {
                x: logical.x,
                y: logical.y,
            })
        }
        WindowEvent::MouseInput { state, button, .. } => {
            let button = match button {
                MouseButton::Left => PointerButton::Primary,
                MouseButton::Right => PointerButton::Secondary,
                MouseButton::Middle => PointerButton::Middle,
                _ => return None,
            };
            Some(HostEvent::PointerButton {
                button,
                pressed: *state == ElementState::Pressed,
            })
        }
        WindowEvent::MouseWheel { delta, .. } => {
            let lines = match delta {
                MouseScrollDelta::LineDelta(_, y) => *y,
                MouseScrollDelta::PixelDelta(p) => (p.y / PIXELS_PER_LINE) as f32,
            };
            Some(HostEvent::Wheel { delta: lines })
        }
        WindowEvent::KeyboardInput { event, .. } => {
            let key = match &event.logical_key {
                WinitKey::Character(s) => s.chars().next().map_or(Key::Other, Key::Character),
                WinitKey::Named(NamedKey::Shift) => Key::Shift,
                WinitKey::Named(NamedKey::Escape) => Key::Escape,
                _ => Key::Other,
            };
            Some(HostEvent::Key {
                key,
                pressed: event.state == ElementState::Pressed,
            })
        }
        _ => None,
    }
}
