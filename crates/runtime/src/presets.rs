use crate::animation::Animator;
use crate::config::ScenePreset;
use crate::error::RuntimeError;
use glam::Vec3;
use serde::Serialize;
use std::f64::consts::PI;
use vista_bindings::{BindingRegistry, FieldRef, MaterialField};
use vista_common::{Axis, NodeId, Transform};
use vista_scene::{DrawableResource, GeometryParam, GeometrySpec, Material, SceneGraph, SceneNode};

/// Radians per second about x and y for the materials showcase.
const MATERIALS_SPIN: Vec3 = Vec3::new(0.15, 0.1, 0.0);

/// What a preset put into the scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstalledPreset {
    pub preset: ScenePreset,
    /// Node the camera should look at.
    pub focus: NodeId,
    /// Panel section holding the preset's bindings.
    pub section: &'static str,
    pub nodes: Vec<NodeId>,
}

fn mesh(
    scene: &mut SceneGraph,
    parent: NodeId,
    name: &str,
    spec: GeometrySpec,
    material: Material,
    position: Vec3,
) -> Result<NodeId, RuntimeError> {
    let drawable = DrawableResource::new(spec.build()?, material);
    let node = SceneNode::new(name)
        .with_transform(Transform::from_position(position))
        .with_drawable(drawable);
    Ok(scene.insert(parent, node)?)
}

/// Build `preset` under the scene root, register its panel bindings and
/// start its animations.
pub fn install(
    preset: ScenePreset,
    scene: &mut SceneGraph,
    bindings: &mut BindingRegistry,
    animator: &mut Animator,
) -> Result<InstalledPreset, RuntimeError> {
    let root = scene.root();
    let installed = match preset {
        ScenePreset::DebugCube => {
            let section = "Awesome cube";
            let material = Material {
                wireframe: true,
                ..Material::basic(0xff0000)
            };
            let cube = mesh(
                scene,
                root,
                "cube",
                GeometrySpec::Box {
                    width: 1.0,
                    height: 1.0,
                    depth: 1.0,
                    width_segments: 2,
                    height_segments: 2,
                    depth_segments: 2,
                },
                material,
                Vec3::ZERO,
            )?;
            bindings.bind(section, FieldRef::Position { node: cube, axis: Axis::Y }, -3.0, 3.0, 0.01)?;
            bindings.bind(section, FieldRef::Position { node: cube, axis: Axis::X }, -3.0, 3.0, 0.01)?;
            bindings.bind_toggle(section, FieldRef::Visible { node: cube })?;
            bindings.bind_toggle(
                section,
                FieldRef::Material {
                    node: cube,
                    field: MaterialField::Wireframe,
                },
            )?;
            bindings.bind(
                section,
                FieldRef::Material {
                    node: cube,
                    field: MaterialField::Color,
                },
                0.0,
                f64::from(0xff_ff_ffu32),
                1.0,
            )?;
            bindings.bind(
                section,
                FieldRef::Geometry {
                    node: cube,
                    param: GeometryParam::Subdivision,
                },
                1.0,
                20.0,
                1.0,
            )?;
            InstalledPreset {
                preset,
                focus: cube,
                section,
                nodes: vec![cube],
            }
        }
        ScenePreset::TransformGroup => {
            let section = "Group";
            let group = scene.insert(
                root,
                SceneNode::new("group").with_transform(Transform {
                    position: Vec3::new(0.0, 1.0, 0.0),
                    rotation: Vec3::new(0.0, std::f32::consts::FRAC_PI_4, 0.0),
                    scale: Vec3::new(0.5, 1.85, 0.36),
                }),
            )?;
            let mut nodes = vec![group];
            for (name, color, x) in [
                ("first", 0xff0000, 0.0),
                ("second", 0x00ff00, 2.0),
                ("third", 0x0000ff, -2.0),
            ] {
                nodes.push(mesh(
                    scene,
                    group,
                    name,
                    GeometrySpec::cube(1.0, 1),
                    Material::basic(color),
                    Vec3::new(x, 0.0, 0.0),
                )?);
            }
            for axis in [Axis::X, Axis::Y, Axis::Z] {
                bindings.bind(section, FieldRef::Position { node: group, axis }, -3.0, 3.0, 0.01)?;
            }
            bindings.bind(section, FieldRef::Rotation { node: group, axis: Axis::Y }, -PI, PI, 0.01)?;
            for axis in [Axis::X, Axis::Y, Axis::Z] {
                bindings.bind(section, FieldRef::Scale { node: group, axis }, 0.1, 3.0, 0.01)?;
            }
            InstalledPreset {
                preset,
                focus: group,
                section,
                nodes,
            }
        }
        ScenePreset::Materials => {
            let section = "Material";
            let objects = scene.insert(root, SceneNode::new("objects"))?;
            let material = Material {
                transmission: 1.0,
                ior: 1.5,
                thickness: 0.5,
                ..Material::physical(0.0, 0.0)
            };
            let shapes = [
                (
                    "sphere",
                    GeometrySpec::Sphere {
                        radius: 0.5,
                        width_segments: 64,
                        height_segments: 64,
                    },
                    -1.5,
                ),
                (
                    "plane",
                    GeometrySpec::Plane {
                        width: 1.0,
                        height: 1.0,
                        width_segments: 100,
                        height_segments: 100,
                    },
                    0.0,
                ),
                (
                    "torus",
                    GeometrySpec::Torus {
                        radius: 0.3,
                        tube: 0.2,
                        radial_segments: 64,
                        tubular_segments: 128,
                    },
                    1.5,
                ),
            ];
            let mut nodes = vec![objects];
            for (name, spec, x) in shapes {
                let node = mesh(
                    scene,
                    objects,
                    name,
                    spec,
                    material.clone(),
                    Vec3::new(x, 0.0, 0.0),
                )?;
                animator.spin(node, MATERIALS_SPIN);
                nodes.push(node);
            }
            for (field, max) in [
                (MaterialField::Metalness, 1.0),
                (MaterialField::Roughness, 1.0),
                (MaterialField::Transmission, 1.0),
                (MaterialField::Thickness, 1.0),
            ] {
                bindings.bind(section, FieldRef::Material { node: objects, field }, 0.0, max, 0.0001)?;
            }
            bindings.bind(
                section,
                FieldRef::Material {
                    node: objects,
                    field: MaterialField::Ior,
                },
                1.0,
                2.333,
                0.0001,
            )?;
            InstalledPreset {
                preset,
                focus: objects,
                section,
                nodes,
            }
        }
        ScenePreset::CursorCube => {
            let section = "Camera";
            let cube = mesh(
                scene,
                root,
                "cube",
                GeometrySpec::cube(1.0, 5),
                Material::basic(0xff0000),
                Vec3::ZERO,
            )?;
            bindings.bind(section, FieldRef::CameraFov, 10.0, 120.0, 1.0)?;
            InstalledPreset {
                preset,
                focus: cube,
                section,
                nodes: vec![cube],
            }
        }
    };
    tracing::info!(
        preset = %preset,
        nodes = installed.nodes.len(),
        bindings = bindings.section(installed.section).count(),
        "scene preset installed"
    );
    Ok(installed)
}
