use serde::{Deserialize, Serialize};
use std::fmt;
use vista_common::{Axis, NodeId};
use vista_scene::GeometryParam;

/// Tunable material property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialField {
    /// `0xRRGGBB` as an integer.
    Color,
    Wireframe,
    Transparent,
    Opacity,
    Metalness,
    Roughness,
    Transmission,
    Ior,
    Thickness,
}

impl MaterialField {
    pub fn is_toggle(self) -> bool {
        matches!(self, Self::Wireframe | Self::Transparent)
    }
}

/// Selects one scalar in the runtime that a binding drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldRef {
    Position { node: NodeId, axis: Axis },
    Rotation { node: NodeId, axis: Axis },
    Scale { node: NodeId, axis: Axis },
    Visible { node: NodeId },
    Material { node: NodeId, field: MaterialField },
    Geometry { node: NodeId, param: GeometryParam },
    CameraFov,
}

impl FieldRef {
    /// Owning node, if the field lives on one.
    pub fn node(&self) -> Option<NodeId> {
        match *self {
            Self::Position { node, .. }
            | Self::Rotation { node, .. }
            | Self::Scale { node, .. }
            | Self::Visible { node }
            | Self::Material { node, .. }
            | Self::Geometry { node, .. } => Some(node),
            Self::CameraFov => None,
        }
    }

    /// Boolean fields bind as `[0, 1]` with step 1.
    pub fn is_toggle(&self) -> bool {
        match self {
            Self::Visible { .. } => true,
            Self::Material { field, .. } => field.is_toggle(),
            _ => false,
        }
    }

    /// Committing this field rebuilds a drawable resource.
    pub fn rebuilds_geometry(&self) -> bool {
        matches!(self, Self::Geometry { .. })
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position { node, axis } => write!(f, "{node}.position.{axis:?}"),
            Self::Rotation { node, axis } => write!(f, "{node}.rotation.{axis:?}"),
            Self::Scale { node, axis } => write!(f, "{node}.scale.{axis:?}"),
            Self::Visible { node } => write!(f, "{node}.visible"),
            Self::Material { node, field } => write!(f, "{node}.material.{field:?}"),
            Self::Geometry { node, param } => write!(f, "{node}.geometry.{param:?}"),
            Self::CameraFov => f.write_str("camera.fov"),
        }
    }
}
