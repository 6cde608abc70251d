use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Handle into the scene-graph node arena.
///
/// The generation makes a stale handle (one whose node was removed and whose
/// slot was reused) distinguishable from the live node occupying the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    pub index: u32,
    pub generation: u32,
}

impl NodeId {
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Spatial transform relative to the parent node.
///
/// Rotation is kept as XYZ Euler angles in radians so each axis can be tuned
/// independently; the quaternion is derived when composing matrices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn quat(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    /// Local matrix: translate * rotate * scale.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quat(), self.position)
    }
}

/// Cartesian axis selector used by per-axis tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn get(self, v: Vec3) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
            Axis::Z => v.z,
        }
    }

    pub fn set(self, v: &mut Vec3, value: f32) {
        match self {
            Axis::X => v.x = value,
            Axis::Y => v.y = value,
            Axis::Z => v.z = value,
        }
    }
}

/// Pixel dimensions of the active render surface, in logical pixels.
///
/// Both sides are always at least 1; the aspect ratio is derived on demand so
/// it can never go stale relative to the stored size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewportSize {
    width: u32,
    height: u32,
}

impl ViewportSize {
    /// Build a size, clamping zero dimensions to 1.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Scale to a drawing-buffer size, never below 1x1.
    pub fn scaled(&self, ratio: f32) -> (u32, u32) {
        let w = (self.width as f32 * ratio).round().max(1.0) as u32;
        let h = (self.height as f32 * ratio).round().max(1.0) as u32;
        (w, h)
    }
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Vec3::ZERO);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn transform_matrix_translates() {
        let t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        let p = t.matrix().transform_point3(Vec3::ZERO);
        assert_eq!(p, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn viewport_clamps_zero() {
        let v = ViewportSize::new(0, 0);
        assert_eq!(v.width(), 1);
        assert_eq!(v.height(), 1);
        assert_eq!(v.aspect(), 1.0);
    }

    #[test]
    fn viewport_aspect() {
        let v = ViewportSize::new(800, 600);
        assert_eq!(v.aspect(), 800.0 / 600.0);
    }

    #[test]
    fn viewport_scaled_rounds() {
        let v = ViewportSize::new(801, 601);
        assert_eq!(v.scaled(2.0), (1602, 1202));
        assert_eq!(ViewportSize::new(1, 1).scaled(0.1), (1, 1));
    }

    #[test]
    fn axis_get_set() {
        let mut v = Vec3::ZERO;
        Axis::Y.set(&mut v, 4.0);
        assert_eq!(Axis::Y.get(v), 4.0);
        assert_eq!(Axis::X.get(v), 0.0);
    }

    #[test]
    fn node_id_display() {
        assert_eq!(NodeId::new(3, 1).to_string(), "#3v1");
    }
}
