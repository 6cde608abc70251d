use crate::action::{Action, normalize_pointer};
use glam::Vec2;
use std::time::{Duration, Instant};
use vista_common::ViewportSize;

/// Two primary presses closer than this in time form a double click.
pub const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(300);
/// ...and closer than this in pixels.
pub const DOUBLE_CLICK_SLOP: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Character(char),
    Shift,
    Escape,
    Other,
}

/// Raw event from the host surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    Resized { width: u32, height: u32 },
    ScaleFactorChanged(f64),
    PointerMoved { x: f32, y: f32 },
    PointerButton { button: PointerButton, pressed: bool },
    /// Wheel lines; positive scrolls away from the user.
    Wheel { delta: f32 },
    Key { key: Key, pressed: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Drag {
    None,
    Orbit,
    Pan,
}

/// Stateful translation of [`HostEvent`]s into [`Action`]s.
///
/// Tracks the viewport for pointer normalisation, the last pointer position
/// for drag deltas, modifier state, and the previous primary press for
/// double-click detection.
#[derive(Debug)]
pub struct InputMapper {
    viewport: ViewportSize,
    pointer: Option<Vec2>,
    shift: bool,
    drag: Drag,
    last_press: Option<(Instant, Vec2)>,
}

impl InputMapper {
    pub fn new(viewport: ViewportSize) -> Self {
        Self {
            viewport,
            pointer: None,
            shift: false,
            drag: Drag::None,
            last_press: None,
        }
    }

    pub fn map(&mut self, event: HostEvent, now: Instant) -> Vec<Action> {
        match event {
            HostEvent::Resized { width, height } => {
                self.viewport = ViewportSize::new(width, height);
                vec![Action::Resize { width, height }]
            }
            HostEvent::ScaleFactorChanged(ratio) => vec![Action::DevicePixelRatio(ratio as f32)],
            HostEvent::PointerMoved { x, y } => {
                let position = Vec2::new(x, y);
                let mut actions = vec![Action::Cursor(normalize_pointer(position, self.viewport))];
                if let Some(previous) = self.pointer {
                    let delta = position - previous;
                    match self.drag {
                        Drag::Orbit => actions.push(Action::Orbit(delta)),
                        Drag::Pan => actions.push(Action::Pan(delta)),
                        Drag::None => {}
                    }
                }
                self.pointer = Some(position);
                actions
            }
            HostEvent::PointerButton { button, pressed } => self.button(button, pressed, now),
            HostEvent::Wheel { delta } => {
                if delta == 0.0 {
                    vec![Action::Noop]
                } else {
                    vec![Action::Zoom(delta)]
                }
            }
            HostEvent::Key { key, pressed } => self.key(key, pressed),
        }
    }

    fn button(&mut self, button: PointerButton, pressed: bool, now: Instant) -> Vec<Action> {
        if !pressed {
            self.drag = Drag::None;
            return vec![Action::Noop];
        }
        match button {
            PointerButton::Primary => {
                self.drag = if self.shift { Drag::Pan } else { Drag::Orbit };
                let at = self.pointer.unwrap_or(Vec2::ZERO);
                let double = self.last_press.is_some_and(|(t, p)| {
                    now.saturating_duration_since(t) <= DOUBLE_CLICK_WINDOW
                        && p.distance(at) <= DOUBLE_CLICK_SLOP
                });
                if double {
                    self.last_press = None;
                    tracing::trace!("double click");
                    vec![Action::ToggleFullscreen]
                } else {
                    self.last_press = Some((now, at));
                    vec![Action::Noop]
                }
            }
            PointerButton::Secondary | PointerButton::Middle => {
                self.drag = Drag::Pan;
                vec![Action::Noop]
            }
        }
    }

    fn key(&mut self, key: Key, pressed: bool) -> Vec<Action> {
        match (key, pressed) {
            (Key::Shift, _) => {
                self.shift = pressed;
                vec![Action::Noop]
            }
            (Key::Character(c), true) => match c.to_ascii_lowercase() {
                'h' => vec![Action::HidePanel],
                's' => vec![Action::ShowPanel],
                _ => vec![Action::Noop],
            },
            _ => vec![Action::Noop],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> InputMapper {
        InputMapper::new(ViewportSize::new(800, 600))
    }

    fn press(m: &mut InputMapper, now: Instant) -> Vec<Action> {
        m.map(
            HostEvent::PointerButton {
                button: PointerButton::Primary,
                pressed: true,
            },
            now,
        )
    }

    fn release(m: &mut InputMapper, now: Instant) -> Vec<Action> {
        m.map(
            HostEvent::PointerButton {
                button: PointerButton::Primary,
                pressed: false,
            },
            now,
        )
    }

    #[test]
    fn pointer_move_is_normalised() {
        let mut m = mapper();
        let actions = m.map(HostEvent::PointerMoved { x: 600.0, y: 150.0 }, Instant::now());
        assert_eq!(actions, vec![Action::Cursor(Vec2::new(0.25, 0.25))]);
    }

    #[test]
    fn resize_updates_normalisation() {
        let mut m = mapper();
        let now = Instant::now();
        assert_eq!(
            m.map(HostEvent::Resized { width: 200, height: 100 }, now),
            vec![Action::Resize { width: 200, height: 100 }]
        );
        let actions = m.map(HostEvent::PointerMoved { x: 200.0, y: 0.0 }, now);
        assert_eq!(actions, vec![Action::Cursor(Vec2::new(0.5, 0.5))]);
    }

    #[test]
    fn drag_orbits_and_shift_drag_pans() {
        let mut m = mapper();
        let now = Instant::now();
        m.map(HostEvent::PointerMoved { x: 10.0, y: 10.0 }, now);
        press(&mut m, now);
        let a = m.map(HostEvent::PointerMoved { x: 15.0, y: 12.0 }, now);
        assert_eq!(a[1], Action::Orbit(Vec2::new(5.0, 2.0)));
        release(&mut m, now);

        m.map(HostEvent::Key { key: Key::Shift, pressed: true }, now);
        press(&mut m, now + Duration::from_secs(1));
        let a = m.map(HostEvent::PointerMoved { x: 20.0, y: 12.0 }, now);
        assert_eq!(a[1], Action::Pan(Vec2::new(5.0, 0.0)));
        release(&mut m, now);

        let a = m.map(HostEvent::PointerMoved { x: 30.0, y: 12.0 }, now);
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn double_click_toggles_fullscreen() {
        let mut m = mapper();
        let t0 = Instant::now();
        m.map(HostEvent::PointerMoved { x: 100.0, y: 100.0 }, t0);
        assert_eq!(press(&mut m, t0), vec![Action::Noop]);
        release(&mut m, t0);
        let second = press(&mut m, t0 + Duration::from_millis(200));
        assert_eq!(second, vec![Action::ToggleFullscreen]);

        // a third press does not chain into another double click
        release(&mut m, t0);
        assert_eq!(
            press(&mut m, t0 + Duration::from_millis(250)),
            vec![Action::Noop]
        );
    }

    #[test]
    fn slow_or_distant_clicks_are_single() {
        let mut m = mapper();
        let t0 = Instant::now();
        press(&mut m, t0);
        release(&mut m, t0);
        assert_eq!(
            press(&mut m, t0 + Duration::from_millis(400)),
            vec![Action::Noop]
        );
        release(&mut m, t0);
        m.map(HostEvent::PointerMoved { x: 50.0, y: 0.0 }, t0);
        assert_eq!(
            press(&mut m, t0 + Duration::from_millis(500)),
            vec![Action::Noop]
        );
    }

    #[test]
    fn panel_keys() {
        let mut m = mapper();
        let now = Instant::now();
        let key = |c| HostEvent::Key {
            key: Key::Character(c),
            pressed: true,
        };
        assert_eq!(m.map(key('h'), now), vec![Action::HidePanel]);
        assert_eq!(m.map(key('S'), now), vec![Action::ShowPanel]);
        assert_eq!(m.map(key('x'), now), vec![Action::Noop]);
    }

    #[test]
    fn wheel_zooms() {
        let mut m = mapper();
        let now = Instant::now();
        assert_eq!(
            m.map(HostEvent::Wheel { delta: 2.0 }, now),
            vec![Action::Zoom(2.0)]
        );
        assert_eq!(m.map(HostEvent::Wheel { delta: 0.0 }, now), vec![Action::Noop]);
    }
}
