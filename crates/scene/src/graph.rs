use crate::drawable::{DrawableResource, ResourceId};
use crate::geometry::{GeometryError, GeometrySpec};
use glam::Mat4;
use serde::{Deserialize, Serialize};
use vista_common::{NodeId, Transform};

/// Errors from scene graph operations.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("node {0} not found")]
    NodeNotFound(NodeId),
    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },
    #[error("node {0} has no drawable resource")]
    NoDrawable(NodeId),
    #[error("geometry rebuild failed: {0}")]
    Geometry(#[from] GeometryError),
}

/// A record of one structural mutation to the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneEvent {
    NodeInserted { id: NodeId, parent: NodeId },
    /// A subtree rooted at `id` was destroyed; `nodes` counts the whole subtree.
    NodeRemoved { id: NodeId, nodes: usize },
    Reparented {
        id: NodeId,
        old_parent: NodeId,
        new_parent: NodeId,
    },
    ResourceInstalled { node: NodeId, resource: ResourceId },
    ResourceReleased { node: NodeId, resource: ResourceId },
}

/// One node in the hierarchy.
///
/// Construct with [`SceneNode::new`] and hand it to [`SceneGraph::insert`];
/// hierarchy links and the drawable slot are managed by the graph.
#[derive(Debug)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub visible: bool,
    drawable: Option<DrawableResource>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            visible: true,
            drawable: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_drawable(mut self, drawable: DrawableResource) -> Self {
        self.drawable = Some(drawable);
        self
    }

    /// Non-owning link to the parent; `None` only for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn drawable(&self) -> Option<&DrawableResource> {
        self.drawable.as_ref()
    }

    /// Mutable access for material edits. Geometry stays immutable; replace
    /// the resource through [`SceneGraph::rebuild_geometry`] instead.
    pub fn drawable_mut(&mut self) -> Option<&mut DrawableResource> {
        self.drawable.as_mut()
    }
}

/// A drawable node resolved for one frame.
#[derive(Debug)]
pub struct DrawItem<'a> {
    pub node: NodeId,
    pub world: Mat4,
    pub drawable: &'a DrawableResource,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<SceneNode>,
}

/// Arena-backed scene hierarchy with a permanent root node.
#[derive(Debug)]
pub struct SceneGraph {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    len: usize,
    event_log: Vec<SceneEvent>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(SceneNode::new("root")),
            }],
            free: Vec::new(),
            root: NodeId::new(0, 0),
            len: 1,
            event_log: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Live nodes, root included.
    pub fn node_count(&self) -> usize {
        self.len
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
    }

    fn node(&self, id: NodeId) -> Result<&SceneNode, SceneError> {
        self.get(id).ok_or(SceneError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut SceneNode, SceneError> {
        self.get_mut(id).ok_or(SceneError::NodeNotFound(id))
    }

    /// Live nodes in arena order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.node
                .as_ref()
                .map(|n| (NodeId::new(i as u32, s.generation), n))
        })
    }

    /// Find the first node with this name, depth-first from the root.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            if node.name == name {
                return Some(id);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.event_log)
    }

    pub fn events(&self) -> &[SceneEvent] {
        &self.event_log
    }

    /// Attach a freshly built node as the last child of `parent`.
    pub fn insert(&mut self, parent: NodeId, mut node: SceneNode) -> Result<NodeId, SceneError> {
        self.node(parent)?;
        node.parent = Some(parent);
        node.children.clear();
        let resource = node.drawable.as_ref().map(DrawableResource::id);

        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.node = Some(node);
                NodeId::new(index, slot.generation)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId::new(index, 0)
            }
        };
        self.len += 1;
        self.node_mut(parent)?.children.push(id);

        self.event_log.push(SceneEvent::NodeInserted { id, parent });
        if let Some(resource) = resource {
            self.event_log
                .push(SceneEvent::ResourceInstalled { node: id, resource });
        }
        tracing::debug!(%id, %parent, "node inserted");
        Ok(id)
    }

    /// Is `node` equal to `ancestor` or somewhere beneath it?
    pub fn is_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.get(id).and_then(|n| n.parent);
        }
        false
    }

    /// Move an existing node to the end of `parent`'s children.
    ///
    /// # Panics
    /// If `child` is the root, or `parent` lies in `child`'s subtree. Either
    /// would break the tree shape that traversal relies on.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.node(parent)?;
        let old_parent = self.node(child)?.parent;
        assert!(child != self.root, "cannot re-parent the scene root");
        assert!(
            !self.is_descendant(parent, child),
            "re-parenting {child} under its own descendant {parent} would create a cycle"
        );
        let Some(old_parent) = old_parent else {
            unreachable!("non-root nodes always have a parent");
        };

        self.node_mut(old_parent)?.children.retain(|c| *c != child);
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        self.event_log.push(SceneEvent::Reparented {
            id: child,
            old_parent,
            new_parent: parent,
        });
        Ok(())
    }

    /// Detach `child` from `parent` and destroy its subtree.
    ///
    /// Every drawable in the subtree is released. Returns the number of
    /// resources released.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<usize, SceneError> {
        let owner = self.node(child)?.parent;
        if owner != Some(parent) {
            return Err(SceneError::NotAChild { parent, child });
        }
        self.node_mut(parent)?.children.retain(|c| *c != child);

        let mut released = 0;
        let mut nodes = 0;
        let mut stack = vec![child];
        while let Some(id) = stack.pop() {
            let slot = &mut self.slots[id.index as usize];
            let Some(node) = slot.node.take() else {
                continue;
            };
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index);
            self.len -= 1;
            nodes += 1;
            stack.extend(node.children.iter().copied());
            if let Some(drawable) = node.drawable {
                self.event_log.push(SceneEvent::ResourceReleased {
                    node: id,
                    resource: drawable.id(),
                });
                released += 1;
            }
        }
        self.event_log
            .push(SceneEvent::NodeRemoved { id: child, nodes });
        tracing::debug!(%child, nodes, released, "subtree removed");
        Ok(released)
    }

    /// Remove a node from wherever it sits.
    pub fn remove(&mut self, id: NodeId) -> Result<usize, SceneError> {
        match self.node(id)?.parent {
            Some(parent) => self.remove_child(parent, id),
            None => panic!("cannot remove the scene root"),
        }
    }

    pub fn set_transform(&mut self, id: NodeId, transform: Transform) -> Result<(), SceneError> {
        self.node_mut(id)?.transform = transform;
        Ok(())
    }

    /// Compose local transforms from the root down to `id`.
    pub fn world_transform(&self, id: NodeId) -> Result<Mat4, SceneError> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.node(current)?;
            chain.push(node.transform.matrix());
            cursor = node.parent;
        }
        Ok(chain
            .into_iter()
            .rev()
            .fold(Mat4::IDENTITY, |acc, local| acc * local))
    }

    /// Visible drawables depth-first, children in insertion order.
    ///
    /// An invisible node hides its whole subtree.
    pub fn draw_list(&self) -> Vec<DrawItem<'_>> {
        let mut items = Vec::new();
        let mut stack = vec![(self.root, Mat4::IDENTITY)];
        while let Some((id, parent_world)) = stack.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            let world = parent_world * node.transform.matrix();
            if let Some(drawable) = &node.drawable {
                items.push(DrawItem {
                    node: id,
                    world,
                    drawable,
                });
            }
            stack.extend(node.children.iter().rev().map(|c| (*c, world)));
        }
        items
    }

    /// Swap in a new resource, releasing whatever was installed before.
    pub fn install_drawable(
        &mut self,
        id: NodeId,
        resource: DrawableResource,
    ) -> Result<(), SceneError> {
        let new_id = resource.id();
        let node = self.node_mut(id)?;
        let previous = node.drawable.replace(resource);
        self.event_log.push(SceneEvent::ResourceInstalled {
            node: id,
            resource: new_id,
        });
        if let Some(previous) = previous {
            self.event_log.push(SceneEvent::ResourceReleased {
                node: id,
                resource: previous.id(),
            });
        }
        Ok(())
    }

    /// Build geometry from `spec` and install it with the node's current
    /// material. If the build fails the installed resource is left untouched.
    pub fn rebuild_geometry(
        &mut self,
        id: NodeId,
        spec: &GeometrySpec,
    ) -> Result<ResourceId, SceneError> {
        let material = self
            .node(id)?
            .drawable
            .as_ref()
            .map(|d| d.material().clone())
            .ok_or(SceneError::NoDrawable(id))?;
        let geometry = spec.build()?;
        let resource = DrawableResource::new(geometry, material);
        let resource_id = resource.id();
        self.install_drawable(id, resource)?;
        tracing::debug!(node = %id, resource = %resource_id, shape = spec.shape_name(), "geometry rebuilt");
        Ok(resource_id)
    }

    /// Ids of every resource currently owned by a live node.
    pub fn installed_resources(&self) -> Vec<ResourceId> {
        self.iter()
            .filter_map(|(_, n)| n.drawable.as_ref().map(DrawableResource::id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GeometryParam, Material};
    use glam::Vec3;

    fn cube() -> DrawableResource {
        DrawableResource::new(
            GeometrySpec::cube(1.0, 1).build().unwrap(),
            Material::default(),
        )
    }

    #[test]
    fn insert_and_lookup() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let id = scene.insert(root, SceneNode::new("cube")).unwrap();
        assert_eq!(scene.node_count(), 2);
        assert_eq!(scene.get(id).unwrap().parent(), Some(root));
        assert_eq!(scene.get(root).unwrap().children(), &[id]);
        assert_eq!(scene.find("cube"), Some(id));
        assert!(matches!(
            scene.events()[0],
            SceneEvent::NodeInserted { .. }
        ));
    }

    #[test]
    fn world_transform_composes_parents() {
        let mut scene = SceneGraph::new();
        let group = scene
            .insert(
                scene.root(),
                SceneNode::new("group").with_transform(Transform::from_position(Vec3::Y)),
            )
            .unwrap();
        let leaf = scene
            .insert(
                group,
                SceneNode::new("leaf").with_transform(Transform::from_position(Vec3::X * 2.0)),
            )
            .unwrap();
        let world = scene.world_transform(leaf).unwrap();
        assert_eq!(world.w_axis.truncate(), Vec3::new(2.0, 1.0, 0.0));

        // mid-frame writes are visible immediately
        scene
            .set_transform(group, Transform::from_position(Vec3::Z))
            .unwrap();
        let world = scene.world_transform(leaf).unwrap();
        assert_eq!(world.w_axis.truncate(), Vec3::new(2.0, 0.0, 1.0));
    }

    #[test]
    fn scale_propagates_to_children() {
        let mut scene = SceneGraph::new();
        let t = Transform {
            scale: Vec3::splat(2.0),
            ..Default::default()
        };
        let group = scene
            .insert(scene.root(), SceneNode::new("g").with_transform(t))
            .unwrap();
        let leaf = scene
            .insert(
                group,
                SceneNode::new("l").with_transform(Transform::from_position(Vec3::X)),
            )
            .unwrap();
        let p = scene.world_transform(leaf).unwrap().transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn remove_releases_subtree() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let group = scene
            .insert(root, SceneNode::new("group").with_drawable(cube()))
            .unwrap();
        scene
            .insert(group, SceneNode::new("a").with_drawable(cube()))
            .unwrap();
        let b = scene.insert(group, SceneNode::new("b")).unwrap();
        scene
            .insert(b, SceneNode::new("c").with_drawable(cube()))
            .unwrap();
        assert_eq!(scene.installed_resources().len(), 3);

        scene.drain_events();
        let released = scene.remove_child(root, group).unwrap();
        assert_eq!(released, 3);
        assert_eq!(scene.node_count(), 1);
        assert!(scene.installed_resources().is_empty());
        assert!(!scene.contains(group));

        let events = scene.drain_events();
        let releases = events
            .iter()
            .filter(|e| matches!(e, SceneEvent::ResourceReleased { .. }))
            .count();
        assert_eq!(releases, 3);
        assert!(matches!(
            events.last(),
            Some(SceneEvent::NodeRemoved { nodes: 4, .. })
        ));
    }

    #[test]
    fn remove_child_checks_parent() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let a = scene.insert(root, SceneNode::new("a")).unwrap();
        let b = scene.insert(root, SceneNode::new("b")).unwrap();
        assert!(matches!(
            scene.remove_child(a, b),
            Err(SceneError::NotAChild { .. })
        ));
        assert!(scene.contains(b));
    }

    #[test]
    fn stale_id_does_not_alias() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let a = scene.insert(root, SceneNode::new("a")).unwrap();
        scene.remove(a).unwrap();
        let b = scene.insert(root, SceneNode::new("b")).unwrap();
        assert_eq!(a.index, b.index);
        assert_ne!(a, b);
        assert!(scene.get(a).is_none());
        assert_eq!(scene.get(b).unwrap().name, "b");
    }

    #[test]
    fn reparent_moves_node() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let a = scene.insert(root, SceneNode::new("a")).unwrap();
        let b = scene.insert(root, SceneNode::new("b")).unwrap();
        scene.add_child(a, b).unwrap();
        assert_eq!(scene.get(root).unwrap().children(), &[a]);
        assert_eq!(scene.get(a).unwrap().children(), &[b]);
        assert_eq!(scene.get(b).unwrap().parent(), Some(a));
    }

    #[test]
    #[should_panic(expected = "cycle")]
    fn reparent_under_descendant_panics() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let a = scene.insert(root, SceneNode::new("a")).unwrap();
        let b = scene.insert(a, SceneNode::new("b")).unwrap();
        let _ = scene.add_child(b, a);
    }

    #[test]
    #[should_panic(expected = "cycle")]
    fn reparent_under_self_panics() {
        let mut scene = SceneGraph::new();
        let a = scene.insert(scene.root(), SceneNode::new("a")).unwrap();
        let _ = scene.add_child(a, a);
    }

    #[test]
    fn draw_list_skips_hidden_subtrees() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let group = scene.insert(root, SceneNode::new("group")).unwrap();
        let a = scene
            .insert(group, SceneNode::new("a").with_drawable(cube()))
            .unwrap();
        let b = scene
            .insert(root, SceneNode::new("b").with_drawable(cube()))
            .unwrap();
        let order: Vec<_> = scene.draw_list().iter().map(|i| i.node).collect();
        assert_eq!(order, vec![a, b]);

        scene.get_mut(group).unwrap().visible = false;
        let order: Vec<_> = scene.draw_list().iter().map(|i| i.node).collect();
        assert_eq!(order, vec![b]);
    }

    #[test]
    fn install_swaps_exactly_one() {
        let mut scene = SceneGraph::new();
        let n = scene
            .insert(scene.root(), SceneNode::new("n").with_drawable(cube()))
            .unwrap();
        let first = scene.installed_resources();
        scene.install_drawable(n, cube()).unwrap();
        let second = scene.installed_resources();
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_ne!(first, second);
    }

    #[test]
    fn rebuild_keeps_material() {
        let mut scene = SceneGraph::new();
        let res = DrawableResource::new(
            GeometrySpec::cube(1.0, 1).build().unwrap(),
            Material::basic(0x00ff00),
        );
        let n = scene
            .insert(scene.root(), SceneNode::new("n").with_drawable(res))
            .unwrap();
        let spec = GeometrySpec::cube(1.0, 1)
            .with_param(GeometryParam::Subdivision, 4.0)
            .unwrap();
        let id = scene.rebuild_geometry(n, &spec).unwrap();
        let d = scene.get(n).unwrap().drawable().unwrap();
        assert_eq!(d.id(), id);
        assert_eq!(d.material().color, 0x00ff00);
        assert_eq!(d.geometry().vertex_count(), 6 * 25);
    }

    #[test]
    fn failed_rebuild_keeps_prior_resource() {
        let mut scene = SceneGraph::new();
        let n = scene
            .insert(scene.root(), SceneNode::new("n").with_drawable(cube()))
            .unwrap();
        let before = scene.installed_resources();
        scene.drain_events();

        let err = scene
            .rebuild_geometry(n, &GeometrySpec::cube(1.0, 0))
            .unwrap_err();
        assert!(matches!(err, SceneError::Geometry(_)));
        assert_eq!(scene.installed_resources(), before);
        assert!(scene.events().is_empty());
        assert!(scene.get(n).unwrap().visible);
    }

    #[test]
    fn rebuild_without_drawable_errors() {
        let mut scene = SceneGraph::new();
        let n = scene.insert(scene.root(), SceneNode::new("n")).unwrap();
        assert!(matches!(
            scene.rebuild_geometry(n, &GeometrySpec::cube(1.0, 1)),
            Err(SceneError::NoDrawable(_))
        ));
    }
}
