use std::collections::HashMap;
use vista_bindings::{BindingTarget, FieldRef, MaterialField};
use vista_camera::CameraRig;
use vista_common::NodeId;
use vista_scene::{GeometryError, GeometrySpec, Material, SceneError, SceneGraph};

#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error("{0} has no material to drive")]
    NoMaterial(NodeId),
    #[error("{0} does not apply to an orthographic camera")]
    NotApplicable(FieldRef),
}

/// Geometry parameters edited since the last commit, per node.
pub type StagedGeometry = HashMap<NodeId, GeometrySpec>;

/// Scene and camera viewed as the target of binding mutations during one
/// tick.
///
/// Geometry sets only stage a new spec; the rebuild happens once, on commit.
/// A material field on a node without a drawable drives the drawables of its
/// direct children, so a group can share one set of shading controls.
pub struct SceneTarget<'a> {
    pub scene: &'a mut SceneGraph,
    pub camera: &'a mut CameraRig,
    pub staged: &'a mut StagedGeometry,
    /// Geometry rebuilds performed through this target.
    pub rebuilds: usize,
}

impl<'a> SceneTarget<'a> {
    pub fn new(
        scene: &'a mut SceneGraph,
        camera: &'a mut CameraRig,
        staged: &'a mut StagedGeometry,
    ) -> Self {
        Self {
            scene,
            camera,
            staged,
            rebuilds: 0,
        }
    }

    fn installed_spec(&self, node: NodeId) -> Result<GeometrySpec, SceneError> {
        let n = self.scene.get(node).ok_or(SceneError::NodeNotFound(node))?;
        n.drawable()
            .map(|d| d.geometry().spec().clone())
            .ok_or(SceneError::NoDrawable(node))
    }

    fn current_spec(&self, node: NodeId) -> Result<GeometrySpec, SceneError> {
        match self.staged.get(&node) {
            Some(spec) => Ok(spec.clone()),
            None => self.installed_spec(node),
        }
    }

    fn material_nodes(&self, node: NodeId) -> Result<Vec<NodeId>, FieldError> {
        let n = self.scene.get(node).ok_or(SceneError::NodeNotFound(node))?;
        if n.drawable().is_some() {
            return Ok(vec![node]);
        }
        let children: Vec<NodeId> = n
            .children()
            .iter()
            .copied()
            .filter(|c| self.scene.get(*c).is_some_and(|c| c.drawable().is_some()))
            .collect();
        if children.is_empty() {
            return Err(FieldError::NoMaterial(node));
        }
        Ok(children)
    }

    fn write(&mut self, field: &FieldRef, value: f64) -> Result<(), FieldError> {
        let v = value as f32;
        match *field {
            FieldRef::Position { node, axis } => {
                let n = self.scene.get_mut(node).ok_or(SceneError::NodeNotFound(node))?;
                axis.set(&mut n.transform.position, v);
            }
            FieldRef::Rotation { node, axis } => {
                let n = self.scene.get_mut(node).ok_or(SceneError::NodeNotFound(node))?;
                axis.set(&mut n.transform.rotation, v);
            }
            FieldRef::Scale { node, axis } => {
                let n = self.scene.get_mut(node).ok_or(SceneError::NodeNotFound(node))?;
                axis.set(&mut n.transform.scale, v);
            }
            FieldRef::Visible { node } => {
                let n = self.scene.get_mut(node).ok_or(SceneError::NodeNotFound(node))?;
                n.visible = value >= 0.5;
            }
            FieldRef::Material { node, field } => {
                for id in self.material_nodes(node)? {
                    if let Some(drawable) = self.scene.get_mut(id).and_then(|n| n.drawable_mut()) {
                        write_material(drawable.material_mut(), field, value);
                    }
                }
            }
            FieldRef::Geometry { node, param } => {
                let spec = self.current_spec(node)?.with_param(param, value)?;
                self.staged.insert(node, spec);
            }
            FieldRef::CameraFov => {
                if self.camera.fov_degrees().is_none() {
                    return Err(FieldError::NotApplicable(*field));
                }
                self.camera.set_fov_degrees(v);
            }
        }
        Ok(())
    }
}

impl BindingTarget for SceneTarget<'_> {
    type Error = FieldError;

    fn read_field(&self, field: &FieldRef) -> Option<f64> {
        let value = match *field {
            FieldRef::Position { node, axis } => axis.get(self.scene.get(node)?.transform.position),
            FieldRef::Rotation { node, axis } => axis.get(self.scene.get(node)?.transform.rotation),
            FieldRef::Scale { node, axis } => axis.get(self.scene.get(node)?.transform.scale),
            FieldRef::Visible { node } => {
                if self.scene.get(node)?.visible {
                    1.0
                } else {
                    0.0
                }
            }
            FieldRef::Material { node, field } => {
                let id = *self.material_nodes(node).ok()?.first()?;
                let material = self.scene.get(id)?.drawable()?.material();
                return Some(read_material(material, field));
            }
            FieldRef::Geometry { node, param } => {
                return self.current_spec(node).ok()?.param(param);
            }
            FieldRef::CameraFov => self.camera.fov_degrees()?,
        };
        Some(value as f64)
    }

    fn set_field(&mut self, field: &FieldRef, value: f64) -> Result<(), FieldError> {
        self.write(field, value)
    }

    fn commit_field(&mut self, field: &FieldRef, value: f64) -> Result<(), FieldError> {
        let FieldRef::Geometry { node, param } = *field else {
            return self.write(field, value);
        };
        // the staged spec is consumed whether or not the rebuild succeeds
        let base = match self.staged.remove(&node) {
            Some(spec) => spec,
            None => self.installed_spec(node)?,
        };
        let spec = base.with_param(param, value)?;
        self.scene.rebuild_geometry(node, &spec)?;
        self.rebuilds += 1;
        Ok(())
    }
}

fn write_material(material: &mut Material, field: MaterialField, value: f64) {
    let v = value as f32;
    match field {
        MaterialField::Color => material.color = value.clamp(0.0, f64::from(0xff_ff_ffu32)) as u32,
        MaterialField::Wireframe => material.wireframe = value >= 0.5,
        MaterialField::Transparent => material.transparent = value >= 0.5,
        MaterialField::Opacity => material.opacity = v,
        MaterialField::Metalness => material.metalness = v,
        MaterialField::Roughness => material.roughness = v,
        MaterialField::Transmission => material.transmission = v,
        MaterialField::Ior => material.ior = v,
        MaterialField::Thickness => material.thickness = v,
    }
    material.sanitize();
}

fn read_material(material: &Material, field: MaterialField) -> f64 {
    let flag = |b: bool| if b { 1.0 } else { 0.0 };
    match field {
        MaterialField::Color => f64::from(material.color),
        MaterialField::Wireframe => flag(material.wireframe),
        MaterialField::Transparent => flag(material.transparent),
        MaterialField::Opacity => f64::from(material.opacity),
        MaterialField::Metalness => f64::from(material.metalness),
        MaterialField::Roughness => f64::from(material.roughness),
        MaterialField::Transmission => f64::from(material.transmission),
        MaterialField::Ior => f64::from(material.ior),
        MaterialField::Thickness => f64::from(material.thickness),
    }
}
