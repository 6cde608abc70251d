use crate::controls::{CursorFollow, InputSample, OrbitControls};
use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use vista_common::ViewportSize;

const MIN_FOV_DEGREES: f32 = 1.0;
const MAX_FOV_DEGREES: f32 = 179.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CameraError {
    #[error("invalid clip planes near={near} far={far}: need 0 < near < far")]
    InvalidClipPlanes { near: f32, far: f32 },
    #[error("invalid orthographic half height {0}")]
    InvalidOrthoBounds(f32),
}

/// Projection kind and its shape parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Projection {
    /// Vertical field of view in radians.
    Perspective { fov_y: f32 },
    /// Bounds are `±half_height · aspect` by `±half_height`.
    Orthographic { half_height: f32 },
}

/// Camera position and orientation in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 3.0),
            orientation: Quat::IDENTITY,
        }
    }
}

impl Pose {
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }
}

/// Interaction mode of a rig.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CameraMode {
    Orbit(OrbitControls),
    CursorFollow(CursorFollow),
}

impl CameraMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Orbit(_) => "orbit",
            Self::CursorFollow(_) => "cursor_follow",
        }
    }
}

/// Projection plus pose, updated once per tick.
#[derive(Debug, Clone)]
pub struct CameraRig {
    projection: Projection,
    near: f32,
    far: f32,
    pose: Pose,
    mode: CameraMode,
    viewport: ViewportSize,
    projection_matrix: Mat4,
    projection_dirty: bool,
}

impl CameraRig {
    /// Perspective rig, 75° vertical fov, clip planes `0.1..100`, at `(0, 0, 3)`
    /// looking down -Z.
    pub fn new(mode: CameraMode) -> Self {
        let mut rig = Self {
            projection: Projection::Perspective {
                fov_y: 75f32.to_radians(),
            },
            near: 0.1,
            far: 100.0,
            pose: Pose::default(),
            mode,
            viewport: ViewportSize::default(),
            projection_matrix: Mat4::IDENTITY,
            projection_dirty: true,
        };
        rig.recompute();
        rig
    }

    pub fn with_projection(mut self, projection: Projection) -> Result<Self, CameraError> {
        self.set_projection(projection)?;
        Ok(self)
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.pose.position = position;
        self
    }

    pub fn mode(&self) -> &CameraMode {
        &self.mode
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    /// Aspect of the viewport last passed to [`update_projection`](Self::update_projection).
    pub fn aspect(&self) -> f32 {
        self.viewport.aspect()
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    /// True when a projection parameter changed since the last
    /// [`update_projection`](Self::update_projection).
    pub fn projection_dirty(&self) -> bool {
        self.projection_dirty
    }

    /// Rebuild the projection matrix for `viewport`.
    pub fn update_projection(&mut self, viewport: ViewportSize) {
        self.viewport = viewport;
        self.recompute();
        tracing::trace!(aspect = self.aspect(), "projection updated");
    }

    fn recompute(&mut self) {
        let aspect = self.viewport.aspect();
        self.projection_matrix = match self.projection {
            Projection::Perspective { fov_y } => {
                Mat4::perspective_rh(fov_y, aspect, self.near, self.far)
            }
            Projection::Orthographic { half_height } => Mat4::orthographic_rh(
                -half_height * aspect,
                half_height * aspect,
                -half_height,
                half_height,
                self.near,
                self.far,
            ),
        };
        self.projection_dirty = false;
    }

    pub fn set_projection(&mut self, projection: Projection) -> Result<(), CameraError> {
        let projection = match projection {
            Projection::Perspective { fov_y } => Projection::Perspective {
                fov_y: clamp_fov(fov_y.to_degrees()).to_radians(),
            },
            Projection::Orthographic { half_height } => {
                if !(half_height.is_finite() && half_height > 0.0) {
                    tracing::warn!(half_height, "rejected orthographic bounds");
                    return Err(CameraError::InvalidOrthoBounds(half_height));
                }
                projection
            }
        };
        self.projection = projection;
        self.projection_dirty = true;
        Ok(())
    }

    /// Change the vertical field of view, clamped to a usable range.
    /// Has no effect on an orthographic rig. Returns the applied value.
    pub fn set_fov_degrees(&mut self, degrees: f32) -> f32 {
        let applied = clamp_fov(degrees);
        if let Projection::Perspective { fov_y } = &mut self.projection {
            *fov_y = applied.to_radians();
            self.projection_dirty = true;
        }
        applied
    }

    pub fn fov_degrees(&self) -> Option<f32> {
        match self.projection {
            Projection::Perspective { fov_y } => Some(fov_y.to_degrees()),
            Projection::Orthographic { .. } => None,
        }
    }

    /// Replace the clip planes. An invalid pair is logged and rejected; the
    /// previous planes stay in effect.
    pub fn set_clip_planes(&mut self, near: f32, far: f32) -> Result<(), CameraError> {
        let valid = near.is_finite() && far.is_finite() && near > 0.0 && far > near;
        if !valid {
            tracing::warn!(near, far, kept_near = self.near, kept_far = self.far, "rejected clip planes");
            return Err(CameraError::InvalidClipPlanes { near, far });
        }
        self.near = near;
        self.far = far;
        self.projection_dirty = true;
        Ok(())
    }

    /// Orient toward `target`. In orbit mode this also moves the orbit pivot;
    /// in cursor-follow mode it sets the focus point.
    pub fn look_at(&mut self, target: Vec3) {
        match &mut self.mode {
            CameraMode::Orbit(orbit) => orbit.target = target,
            CameraMode::CursorFollow(follow) => follow.focus = target,
        }
        self.orient_toward(target);
    }

    fn orient_toward(&mut self, target: Vec3) {
        let dir = target - self.pose.position;
        if dir.length_squared() < 1e-12 {
            return;
        }
        let forward = dir.normalize();
        let up = if forward.cross(Vec3::Y).length_squared() < 1e-8 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let view = Mat4::look_to_rh(self.pose.position, forward, up);
        let (_, rotation, _) = view.inverse().to_scale_rotation_translation();
        self.pose.orientation = rotation.normalize();
    }

    /// Advance the pose by one tick of input.
    pub fn update_pose(&mut self, input: &InputSample) {
        match &mut self.mode {
            CameraMode::Orbit(orbit) => {
                let fov_y = match self.projection {
                    Projection::Perspective { fov_y } => fov_y,
                    Projection::Orthographic { .. } => std::f32::consts::FRAC_PI_2,
                };
                orbit.push_input(
                    input,
                    self.pose.position,
                    self.pose.orientation,
                    self.viewport.height(),
                    fov_y,
                );
                self.pose.position = orbit.update(self.pose.position);
                let target = orbit.target;
                self.orient_toward(target);
            }
            CameraMode::CursorFollow(follow) => {
                if let Some(pointer) = input.pointer {
                    follow.set_cursor(pointer);
                }
                self.pose.position = follow.position();
                let focus = follow.focus;
                self.orient_toward(focus);
            }
        }
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.pose.orientation, self.pose.position).inverse()
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix()
    }
}

fn clamp_fov(degrees: f32) -> f32 {
    if degrees.is_nan() {
        return 75.0;
    }
    degrees.clamp(MIN_FOV_DEGREES, MAX_FOV_DEGREES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn orbit_rig() -> CameraRig {
        CameraRig::new(CameraMode::Orbit(OrbitControls::new(Vec3::ZERO, 0.0)))
    }

    /// Horizontal scale of a perspective matrix is `1 / (tan(fov/2) · aspect)`.
    fn matrix_aspect(rig: &CameraRig) -> f32 {
        let m = rig.projection_matrix();
        m.y_axis.y / m.x_axis.x
    }

    #[test]
    fn aspect_follows_viewport() {
        let mut rig = orbit_rig();
        rig.update_projection(ViewportSize::new(800, 600));
        assert_eq!(rig.aspect(), 800.0 / 600.0);
        assert!((matrix_aspect(&rig) - 800.0 / 600.0).abs() < 1e-5);

        rig.update_projection(ViewportSize::new(1920, 1080));
        assert_eq!(rig.aspect(), 1920.0 / 1080.0);
        assert!((matrix_aspect(&rig) - 1920.0 / 1080.0).abs() < 1e-5);
    }

    #[test]
    fn fov_change_marks_dirty() {
        let mut rig = orbit_rig();
        assert!(!rig.projection_dirty());
        assert_eq!(rig.set_fov_degrees(500.0), 179.0);
        assert!(rig.projection_dirty());
        rig.update_projection(rig.viewport());
        assert!(!rig.projection_dirty());
        assert!((rig.fov_degrees().unwrap() - 179.0).abs() < 1e-3);
    }

    #[test]
    fn invalid_clip_planes_keep_last_good() {
        let mut rig = orbit_rig();
        assert!(rig.set_clip_planes(1.0, 0.5).is_err());
        assert!(rig.set_clip_planes(0.0, 10.0).is_err());
        assert!(rig.set_clip_planes(f32::NAN, 10.0).is_err());
        assert_eq!((rig.near(), rig.far()), (0.1, 100.0));
        assert!(!rig.projection_dirty());

        rig.set_clip_planes(0.5, 50.0).unwrap();
        assert_eq!((rig.near(), rig.far()), (0.5, 50.0));
    }

    #[test]
    fn orthographic_bounds() {
        let mut rig = orbit_rig()
            .with_projection(Projection::Orthographic { half_height: 2.0 })
            .unwrap();
        rig.update_projection(ViewportSize::new(400, 200));
        let m = rig.projection_matrix();
        // x spans ±4, y spans ±2
        assert!((m.x_axis.x - 0.25).abs() < 1e-6);
        assert!((m.y_axis.y - 0.5).abs() < 1e-6);
        assert_eq!(rig.fov_degrees(), None);

        assert!(rig
            .set_projection(Projection::Orthographic { half_height: 0.0 })
            .is_err());
    }

    #[test]
    fn look_at_orients_forward() {
        let mut rig = orbit_rig().with_position(Vec3::new(3.0, 0.0, 0.0));
        rig.look_at(Vec3::ZERO);
        let f = rig.pose().forward();
        assert!((f - Vec3::NEG_X).length() < 1e-5, "{f}");
        let view_origin = rig.view_matrix().transform_point3(Vec3::ZERO);
        assert!((view_origin - Vec3::new(0.0, 0.0, -3.0)).length() < 1e-4);
    }

    #[test]
    fn look_at_straight_down() {
        let mut rig = orbit_rig().with_position(Vec3::new(0.0, 5.0, 0.0));
        rig.look_at(Vec3::ZERO);
        assert!((rig.pose().forward() - Vec3::NEG_Y).length() < 1e-5);
    }

    #[test]
    fn orbit_update_keeps_looking_at_target() {
        let mut rig = orbit_rig();
        rig.update_projection(ViewportSize::new(800, 600));
        rig.update_pose(&InputSample {
            orbit: Vec2::new(-100.0, 40.0),
            ..Default::default()
        });
        let to_target = (Vec3::ZERO - rig.pose().position).normalize();
        assert!((rig.pose().forward() - to_target).length() < 1e-4);
        assert!((rig.pose().position.length() - 3.0).abs() < 1e-4);
    }

    #[test]
    fn cursor_follow_is_stateless() {
        let mut rig = CameraRig::new(CameraMode::CursorFollow(CursorFollow::default()));
        let sample = InputSample {
            pointer: Some(Vec2::new(0.25, 0.0)),
            ..Default::default()
        };
        rig.update_pose(&sample);
        let first = rig.pose().position;
        assert!((first - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-4);

        // no pointer movement: same pose every tick
        rig.update_pose(&InputSample::default());
        assert_eq!(rig.pose().position, first);
        assert!((rig.pose().forward() - Vec3::NEG_X).length() < 1e-4);
        assert_eq!(rig.mode().name(), "cursor_follow");
    }
}
