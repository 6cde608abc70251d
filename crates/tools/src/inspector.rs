use serde::Serialize;
use std::fmt;
use vista_bindings::BindingRegistry;
use vista_common::NodeId;
use vista_frame::LoopState;
use vista_runtime::SceneRuntime;
use vista_scene::{MaterialKind, SceneGraph};

/// Read-only queries against a scene runtime for the debug panel and CLI.
pub struct SceneInspector;

impl SceneInspector {
    pub fn summary(runtime: &SceneRuntime) -> RuntimeSummary {
        let scene = runtime.scene();
        let camera = runtime.camera();
        let viewport = runtime.viewport();
        let frame_loop = runtime.frame_loop();
        let items = scene.draw_list();
        let p = camera.pose().position;
        RuntimeSummary {
            preset: runtime.preset().map(|p| p.preset.to_string()),
            viewport: [viewport.size().width(), viewport.size().height()],
            pixel_ratio: viewport.effective_pixel_ratio(),
            camera_mode: camera.mode().name().to_string(),
            camera_position: [p.x, p.y, p.z],
            aspect: camera.aspect(),
            fov_degrees: camera.fov_degrees(),
            loop_state: frame_loop.state(),
            ticks: frame_loop.ticks(),
            avg_tick_ms: frame_loop.timer().average().as_secs_f64() * 1000.0,
            max_tick_ms: frame_loop.timer().max().as_secs_f64() * 1000.0,
            nodes: scene.node_count(),
            drawables: items.len(),
            triangles: items
                .iter()
                .map(|i| i.drawable.geometry().triangle_count())
                .sum(),
            bindings: runtime.bindings().len(),
            pending_mutations: runtime.bindings().pending().len(),
            animations: runtime.animator().len(),
            assets: runtime.assets().len(),
            panel_visible: runtime.panel_visible(),
            fullscreen_failures: runtime.fullscreen().failures(),
        }
    }

    pub fn inspect_node(scene: &SceneGraph, id: NodeId) -> Option<NodeInfo> {
        let node = scene.get(id)?;
        let mut depth = 0;
        let mut cursor = node.parent();
        while let Some(parent) = cursor {
            depth += 1;
            cursor = scene.get(parent).and_then(|n| n.parent());
        }
        let world = scene.world_transform(id).ok()?.w_axis;
        let t = node.transform;
        Some(NodeInfo {
            id,
            name: node.name.clone(),
            depth,
            visible: node.visible,
            position: t.position.to_array(),
            rotation: t.rotation.to_array(),
            scale: t.scale.to_array(),
            world_position: [world.x, world.y, world.z],
            drawable: node.drawable().map(|d| DrawableInfo {
                resource: d.id().0,
                shape: d.geometry().spec().shape_name(),
                vertices: d.geometry().vertex_count(),
                triangles: d.geometry().triangle_count(),
                material: d.material().kind,
                color: d.material().color,
                wireframe: d.material().wireframe,
            }),
        })
    }

    /// Every node in depth-first order from the root, children in order.
    pub fn list_nodes(scene: &SceneGraph) -> Vec<NodeInfo> {
        let mut out = Vec::new();
        let mut stack = vec![scene.root()];
        while let Some(id) = stack.pop() {
            let Some(node) = scene.get(id) else {
                continue;
            };
            stack.extend(node.children().iter().rev().copied());
            out.extend(Self::inspect_node(scene, id));
        }
        out
    }

    /// Bindings grouped by section, in registration order.
    pub fn bindings(registry: &BindingRegistry) -> Vec<BindingInfo> {
        registry
            .iter()
            .map(|(_, b)| BindingInfo {
                section: b.section().to_string(),
                field: b.field().to_string(),
                min: b.min(),
                max: b.max(),
                step: b.step(),
                value: b.value(),
                last_failure: b.last_failure().map(str::to_string),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RuntimeSummary {
    pub preset: Option<String>,
    pub viewport: [u32; 2],
    pub pixel_ratio: f32,
    pub camera_mode: String,
    pub camera_position: [f32; 3],
    pub aspect: f32,
    pub fov_degrees: Option<f32>,
    pub loop_state: LoopState,
    pub ticks: u64,
    pub avg_tick_ms: f64,
    pub max_tick_ms: f64,
    pub nodes: usize,
    pub drawables: usize,
    pub triangles: usize,
    pub bindings: usize,
    pub pending_mutations: usize,
    pub animations: usize,
    pub assets: usize,
    pub panel_visible: bool,
    pub fullscreen_failures: u64,
}

impl fmt::Display for RuntimeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Scene: preset={} nodes={} drawables={} triangles={}",
            self.preset.as_deref().unwrap_or("none"),
            self.nodes,
            self.drawables,
            self.triangles
        )?;
        writeln!(
            f,
            "Viewport: {}x{} @{:.1}x aspect={:.3}",
            self.viewport[0], self.viewport[1], self.pixel_ratio, self.aspect
        )?;
        writeln!(
            f,
            "Camera: {} pos=({:.2}, {:.2}, {:.2}) fov={}",
            self.camera_mode,
            self.camera_position[0],
            self.camera_position[1],
            self.camera_position[2],
            self.fov_degrees
                .map_or_else(|| "ortho".to_string(), |v| format!("{v:.1}"))
        )?;
        write!(
            f,
            "Loop: {:?} ticks={} avg={:.3}ms max={:.3}ms bindings={} pending={} animations={} assets={}",
            self.loop_state,
            self.ticks,
            self.avg_tick_ms,
            self.max_tick_ms,
            self.bindings,
            self.pending_mutations,
            self.animations,
            self.assets
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DrawableInfo {
    pub resource: u64,
    pub shape: &'static str,
    pub vertices: usize,
    pub triangles: usize,
    pub material: MaterialKind,
    pub color: u32,
    pub wireframe: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeInfo {
    pub id: NodeId,
    pub name: String,
    pub depth: usize,
    pub visible: bool,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
    pub world_position: [f32; 3],
    pub drawable: Option<DrawableInfo>,
}

impl fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:indent$}{} {} world=({:.2}, {:.2}, {:.2})",
            "",
            self.id,
            self.name,
            self.world_position[0],
            self.world_position[1],
            self.world_position[2],
            indent = self.depth * 2
        )?;
        if let Some(d) = &self.drawable {
            write!(
                f,
                " {} tris={} {:?} #{:06x}",
                d.shape, d.triangles, d.material, d.color
            )?;
        }
        if !self.visible {
            f.write_str(" hidden")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BindingInfo {
    pub section: String,
    pub field: String,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub value: f64,
    pub last_failure: Option<String>,
}

impl fmt::Display for BindingInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} = {} ({}..={} step {})",
            self.section, self.field, self.value, self.min, self.max, self.step
        )?;
        if let Some(reason) = &self.last_failure {
            write!(f, " last failure: {reason}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vista_frame::FixedRateSync;
    use vista_render::{DebugTextRenderer, RenderBinding};
    use vista_runtime::{RuntimeConfig, ScenePreset, run_headless};

    fn runtime(preset: ScenePreset) -> SceneRuntime {
        let mut config = RuntimeConfig::default();
        config.scene.preset = preset;
        SceneRuntime::from_config(&config).unwrap()
    }

    #[test]
    fn summary_before_any_tick() {
        let rt = runtime(ScenePreset::DebugCube);
        let summary = SceneInspector::summary(&rt);
        assert_eq!(summary.preset.as_deref(), Some("debug_cube"));
        assert_eq!(summary.viewport, [800, 600]);
        assert_eq!(summary.nodes, 2);
        assert_eq!(summary.drawables, 1);
        assert_eq!(summary.ticks, 0);
        assert_eq!(summary.loop_state, LoopState::Idle);
        assert!(summary.panel_visible);
        assert_eq!(summary.animations, 0);
    }

    #[test]
    fn summary_counts_animations() {
        let mut rt = runtime(ScenePreset::Materials);
        assert_eq!(SceneInspector::summary(&rt).animations, 3);
        assert!(rt.spin_focus());
        let summary = SceneInspector::summary(&rt);
        assert_eq!(summary.animations, 4);
        assert!(summary.to_string().contains("animations=4"));
    }

    #[test]
    fn summary_after_ticks() {
        let mut rt = runtime(ScenePreset::TransformGroup);
        let mut render = RenderBinding::new(DebugTextRenderer::new(), 2.0);
        let mut sync = FixedRateSync::new(0);
        run_headless(&mut rt, &mut render, &mut sync, 2, &[], |_, _| {}).unwrap();
        let summary = SceneInspector::summary(&rt);
        assert_eq!(summary.ticks, 2);
        assert_eq!(summary.triangles, 36);
        let text = summary.to_string();
        assert!(text.contains("preset=transform_group"));
        assert!(text.contains("ticks=2"));
    }

    #[test]
    fn list_nodes_depth_first() {
        let rt = runtime(ScenePreset::TransformGroup);
        let nodes = SceneInspector::list_nodes(rt.scene());
        let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["root", "group", "first", "second", "third"]);
        assert_eq!(nodes[2].depth, 2);
        assert!(nodes[1].drawable.is_none());
        assert_eq!(nodes[2].drawable.as_ref().unwrap().shape, "box");
        assert!(nodes[2].to_string().contains("    "));
    }

    #[test]
    fn inspect_missing_node() {
        let rt = runtime(ScenePreset::DebugCube);
        assert!(SceneInspector::inspect_node(rt.scene(), NodeId::new(42, 7)).is_none());
    }

    #[test]
    fn bindings_listing() {
        let mut rt = runtime(ScenePreset::DebugCube);
        let infos = SceneInspector::bindings(rt.bindings());
        assert_eq!(infos.len(), 6);
        assert!(infos.iter().all(|b| b.section == "Awesome cube"));

        let id = rt.bindings().iter().next().map(|(id, _)| id).unwrap();
        rt.bindings_mut().on_user_input(id, 1.5).unwrap();
        let summary = SceneInspector::summary(&rt);
        assert_eq!(summary.pending_mutations, 1);
    }
}
