use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

/// Keeps the polar angle off the poles where `look_at` degenerates.
const POLAR_EPS: f32 = 1e-6;

/// Pointer input gathered since the previous tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSample {
    /// Latest normalised cursor position, each axis in `[-0.5, 0.5]`, y up.
    pub pointer: Option<Vec2>,
    /// Accumulated rotate drag in logical pixels.
    pub orbit: Vec2,
    /// Accumulated pan drag in logical pixels.
    pub pan: Vec2,
    /// Wheel steps; positive moves toward the target.
    pub zoom: f32,
}

impl InputSample {
    pub fn is_empty(&self) -> bool {
        self.pointer.is_none()
            && self.orbit == Vec2::ZERO
            && self.pan == Vec2::ZERO
            && self.zoom == 0.0
    }

    /// Fold a later sample into this one. Deltas add up; the pointer keeps
    /// the most recent position.
    pub fn merge(&mut self, later: &InputSample) {
        if later.pointer.is_some() {
            self.pointer = later.pointer;
        }
        self.orbit += later.orbit;
        self.pan += later.pan;
        self.zoom += later.zoom;
    }
}

/// Damped orbit around a target point.
///
/// Input deltas accumulate into pending rotation, pan and dolly. Each
/// [`update`](Self::update) applies `damping` of the pending amount and keeps
/// the remainder, so motion eases out over subsequent ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitControls {
    pub target: Vec3,
    /// Fraction of pending motion applied per tick. `0` or `1` disables damping.
    pub damping: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar: f32,
    pub max_polar: f32,
    #[serde(skip)]
    pending_theta: f32,
    #[serde(skip)]
    pending_phi: f32,
    #[serde(skip)]
    pending_pan: Vec3,
    #[serde(skip, default = "unit_scale")]
    pending_scale: f32,
}

fn unit_scale() -> f32 {
    1.0
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            damping: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar: 0.0,
            max_polar: PI,
            pending_theta: 0.0,
            pending_phi: 0.0,
            pending_pan: Vec3::ZERO,
            pending_scale: 1.0,
        }
    }
}

impl OrbitControls {
    pub fn new(target: Vec3, damping: f32) -> Self {
        Self {
            target,
            damping,
            ..Default::default()
        }
    }

    fn damped(&self) -> bool {
        self.damping > 0.0 && self.damping < 1.0
    }

    /// Is any rotation, pan or dolly still waiting to be applied?
    pub fn is_moving(&self) -> bool {
        const REST: f32 = 1e-5;
        self.pending_theta.abs() > REST
            || self.pending_phi.abs() > REST
            || self.pending_pan.length() > REST
            || (self.pending_scale - 1.0).abs() > REST
    }

    /// Queue motion from one input sample.
    ///
    /// `viewport_height` is in pixels; `fov_y` scales pan so a drag tracks the
    /// pointer at the target's depth.
    pub fn push_input(
        &mut self,
        input: &InputSample,
        position: Vec3,
        orientation: Quat,
        viewport_height: u32,
        fov_y: f32,
    ) {
        let h = viewport_height.max(1) as f32;
        if input.orbit != Vec2::ZERO {
            self.pending_theta -= TAU * input.orbit.x / h * self.rotate_speed;
            self.pending_phi -= TAU * input.orbit.y / h * self.rotate_speed;
        }
        if input.pan != Vec2::ZERO {
            let distance = (position - self.target).length() * (fov_y / 2.0).tan();
            let right = orientation * Vec3::X;
            let up = orientation * Vec3::Y;
            let dx = 2.0 * input.pan.x * distance / h * self.pan_speed;
            let dy = 2.0 * input.pan.y * distance / h * self.pan_speed;
            self.pending_pan += -right * dx + up * dy;
        }
        if input.zoom != 0.0 {
            let step = 0.95f32.powf(self.zoom_speed);
            self.pending_scale *= step.powf(input.zoom);
        }
    }

    /// Advance one tick and return the new camera position.
    pub fn update(&mut self, position: Vec3) -> Vec3 {
        let offset = position - self.target;
        let mut radius = offset.length();
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = if radius > 0.0 {
            (offset.y / radius).clamp(-1.0, 1.0).acos()
        } else {
            PI / 2.0
        };

        let k = if self.damped() { self.damping } else { 1.0 };
        theta += self.pending_theta * k;
        phi += self.pending_phi * k;
        phi = phi
            .clamp(self.min_polar, self.max_polar)
            .clamp(POLAR_EPS, PI - POLAR_EPS);

        let scale = if self.damped() {
            1.0 + (self.pending_scale - 1.0) * k
        } else {
            self.pending_scale
        };
        radius = (radius * scale).clamp(self.min_distance, self.max_distance);
        self.target += self.pending_pan * k;

        if self.damped() {
            self.pending_theta *= 1.0 - k;
            self.pending_phi *= 1.0 - k;
            self.pending_pan *= 1.0 - k;
            self.pending_scale = 1.0 + (self.pending_scale - 1.0) * (1.0 - k);
        } else {
            self.pending_theta = 0.0;
            self.pending_phi = 0.0;
            self.pending_pan = Vec3::ZERO;
            self.pending_scale = 1.0;
        }

        let sin_phi = phi.sin() * radius;
        self.target + Vec3::new(sin_phi * theta.sin(), phi.cos() * radius, sin_phi * theta.cos())
    }
}

/// Pose as a direct function of the cursor: circle around the focus
/// horizontally, rise with the cursor vertically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorFollow {
    pub focus: Vec3,
    pub radius: f32,
    pub height: f32,
    #[serde(skip)]
    cursor: Vec2,
}

impl Default for CursorFollow {
    fn default() -> Self {
        Self {
            focus: Vec3::ZERO,
            radius: 3.0,
            height: 5.0,
            cursor: Vec2::ZERO,
        }
    }
}

impl CursorFollow {
    pub fn new(radius: f32, height: f32) -> Self {
        Self {
            radius,
            height,
            ..Default::default()
        }
    }

    pub fn cursor(&self) -> Vec2 {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: Vec2) {
        self.cursor = cursor.clamp(Vec2::splat(-0.5), Vec2::splat(0.5));
    }

    pub fn position(&self) -> Vec3 {
        let angle = self.cursor.x * TAU;
        Vec3::new(
            angle.sin() * self.radius,
            self.cursor.y * self.height,
            angle.cos() * self.radius,
        ) + self.focus
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn undamped_rotation_applies_once() {
        let mut orbit = OrbitControls::new(Vec3::ZERO, 0.0);
        let start = Vec3::new(0.0, 0.0, 3.0);
        let input = InputSample {
            orbit: Vec2::new(-150.0, 0.0),
            ..Default::default()
        };
        // quarter turn: 2π · 150 / 600
        orbit.push_input(&input, start, Quat::IDENTITY, 600, 1.0);
        let p = orbit.update(start);
        assert!(close(p, Vec3::new(3.0, 0.0, 0.0)), "{p}");
        assert!(!orbit.is_moving());
        assert!(close(orbit.update(p), p));
    }

    #[test]
    fn damped_rotation_eases_out() {
        let mut orbit = OrbitControls::new(Vec3::ZERO, 0.05);
        let mut p = Vec3::new(0.0, 0.0, 3.0);
        let input = InputSample {
            orbit: Vec2::new(-150.0, 0.0),
            ..Default::default()
        };
        orbit.push_input(&input, p, Quat::IDENTITY, 600, 1.0);

        let mut steps = Vec::new();
        for _ in 0..5 {
            let next = orbit.update(p);
            steps.push((next - p).length());
            p = next;
        }
        assert!(steps[0] > 0.0);
        assert!(steps.windows(2).all(|w| w[1] < w[0]));
        assert!(orbit.is_moving());
        assert!((p.length() - 3.0).abs() < 1e-4);
    }

    #[test]
    fn zoom_clamped_to_distance_bounds() {
        let mut orbit = OrbitControls {
            damping: 0.0,
            min_distance: 2.0,
            max_distance: 4.0,
            ..Default::default()
        };
        let start = Vec3::new(0.0, 0.0, 3.0);
        let zoom_in = InputSample {
            zoom: 50.0,
            ..Default::default()
        };
        orbit.push_input(&zoom_in, start, Quat::IDENTITY, 600, 1.0);
        let p = orbit.update(start);
        assert!((p.length() - 2.0).abs() < 1e-4);

        let zoom_out = InputSample {
            zoom: -50.0,
            ..Default::default()
        };
        orbit.push_input(&zoom_out, p, Quat::IDENTITY, 600, 1.0);
        let p = orbit.update(p);
        assert!((p.length() - 4.0).abs() < 1e-4);
    }

    #[test]
    fn polar_angle_stays_off_pole() {
        let mut orbit = OrbitControls::new(Vec3::ZERO, 0.0);
        let start = Vec3::new(0.0, 0.0, 3.0);
        let input = InputSample {
            orbit: Vec2::new(0.0, 10_000.0),
            ..Default::default()
        };
        orbit.push_input(&input, start, Quat::IDENTITY, 600, 1.0);
        let p = orbit.update(start);
        assert!(p.y <= 3.0 && p.y > 2.99);
        assert!(p.is_finite());
        assert!(p.length() > 2.99);
    }

    #[test]
    fn pan_moves_target_and_camera_together() {
        let mut orbit = OrbitControls::new(Vec3::ZERO, 0.0);
        let start = Vec3::new(0.0, 0.0, 3.0);
        let input = InputSample {
            pan: Vec2::new(-100.0, 0.0),
            ..Default::default()
        };
        orbit.push_input(&input, start, Quat::IDENTITY, 600, 1.0);
        let p = orbit.update(start);
        assert!(orbit.target.x > 0.0);
        assert!(close(p - orbit.target, start));
    }

    #[test]
    fn cursor_follow_positions() {
        let mut follow = CursorFollow::default();
        assert!(close(follow.position(), Vec3::new(0.0, 0.0, 3.0)));

        follow.set_cursor(Vec2::new(0.25, 0.0));
        assert!(close(follow.position(), Vec3::new(3.0, 0.0, 0.0)));

        follow.set_cursor(Vec2::new(0.0, 0.5));
        assert!(close(follow.position(), Vec3::new(0.0, 2.5, 3.0)));

        follow.set_cursor(Vec2::new(9.0, -9.0));
        assert_eq!(follow.cursor(), Vec2::new(0.5, -0.5));
    }

    #[test]
    fn merge_accumulates_deltas() {
        let mut a = InputSample {
            pointer: Some(Vec2::new(0.1, 0.1)),
            orbit: Vec2::ONE,
            ..Default::default()
        };
        a.merge(&InputSample {
            orbit: Vec2::ONE,
            zoom: 1.0,
            ..Default::default()
        });
        assert_eq!(a.pointer, Some(Vec2::new(0.1, 0.1)));
        assert_eq!(a.orbit, Vec2::splat(2.0));
        assert_eq!(a.zoom, 1.0);
        assert!(!a.is_empty());
        assert!(InputSample::default().is_empty());
    }
}
