use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use vista_camera::CameraRig;
use vista_scene::{ResourceId, SceneGraph};

/// Surface parameters handed to [`Renderer::configure`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceInfo {
    /// Logical size; the backbuffer is this times `pixel_density`.
    pub width: u32,
    pub height: u32,
    pub pixel_density: f32,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    /// The surface went away or is out of date. Reconfigure and skip the frame.
    #[error("surface lost: {0}")]
    SurfaceLost(String),
    #[error("drawable resource {resource} unusable: {reason}")]
    InvalidResource { resource: ResourceId, reason: String },
    #[error("renderer not configured")]
    NotConfigured,
    #[error("fatal renderer error: {0}")]
    Fatal(String),
}

impl RenderError {
    /// Fatal errors stop the frame loop; the rest skip one frame.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::SurfaceLost(_))
    }
}

/// Renderer capability. All backends implement this trait.
///
/// The renderer reads scene and camera state and produces output. It never
/// mutates either.
pub trait Renderer {
    /// What one draw produces.
    type Output;

    fn configure(&mut self, surface: SurfaceInfo) -> Result<(), RenderError>;

    /// New logical surface size.
    fn resize(&mut self, width: u32, height: u32);

    fn set_pixel_density(&mut self, ratio: f32);

    /// Render one frame.
    fn draw(&mut self, scene: &SceneGraph, camera: &CameraRig) -> Result<Self::Output, RenderError>;
}

/// Human-readable frame description.
///
/// Useful for the headless host, logging, and exercising the render
/// interface without a GPU.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    surface: Option<SurfaceInfo>,
    frames: u64,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn surface(&self) -> Option<SurfaceInfo> {
        self.surface
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn configure(&mut self, surface: SurfaceInfo) -> Result<(), RenderError> {
        self.surface = Some(surface);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if let Some(s) = self.surface.as_mut() {
            s.width = width;
            s.height = height;
        }
    }

    fn set_pixel_density(&mut self, ratio: f32) {
        if let Some(s) = self.surface.as_mut() {
            s.pixel_density = ratio;
        }
    }

    fn draw(&mut self, scene: &SceneGraph, camera: &CameraRig) -> Result<String, RenderError> {
        let surface = self.surface.ok_or(RenderError::NotConfigured)?;
        self.frames += 1;
        let items = scene.draw_list();
        let pose = camera.pose();
        let mut out = String::new();
        // writing into a String cannot fail
        let _ = writeln!(
            out,
            "=== Frame {} ({}x{} @{:.1}x) ===",
            self.frames, surface.width, surface.height, surface.pixel_density
        );
        let _ = writeln!(
            out,
            "Camera: {} pos=({:.2}, {:.2}, {:.2}) aspect={:.3} near={} far={}",
            camera.mode().name(),
            pose.position.x,
            pose.position.y,
            pose.position.z,
            camera.aspect(),
            camera.near(),
            camera.far()
        );
        let _ = writeln!(out, "Nodes: {} Drawables: {}", scene.node_count(), items.len());
        for item in &items {
            let name = scene.get(item.node).map_or("?", |n| n.name.as_str());
            let p = item.world.w_axis;
            let geometry = item.drawable.geometry();
            let _ = writeln!(
                out,
                "  {} {name} {} tris={} pos=({:.2}, {:.2}, {:.2}){}",
                item.node,
                geometry.spec().shape_name(),
                geometry.triangle_count(),
                p.x,
                p.y,
                p.z,
                if item.drawable.material().wireframe {
                    " wireframe"
                } else {
                    ""
                }
            );
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use vista_camera::{CameraMode, OrbitControls};
    use vista_common::Transform;
    use vista_scene::{DrawableResource, GeometrySpec, Material, SceneNode};

    fn rig() -> CameraRig {
        CameraRig::new(CameraMode::Orbit(OrbitControls::default()))
    }

    fn configured() -> DebugTextRenderer {
        let mut r = DebugTextRenderer::new();
        r.configure(SurfaceInfo {
            width: 800,
            height: 600,
            pixel_density: 1.0,
        })
        .unwrap();
        r
    }

    #[test]
    fn draw_requires_configure() {
        let mut r = DebugTextRenderer::new();
        let err = r.draw(&SceneGraph::new(), &rig()).unwrap_err();
        assert_eq!(err, RenderError::NotConfigured);
        assert!(err.is_fatal());
    }

    #[test]
    fn empty_scene() {
        let out = configured().draw(&SceneGraph::new(), &rig()).unwrap();
        assert!(out.contains("800x600"));
        assert!(out.contains("Drawables: 0"));
        assert!(out.contains("orbit"));
    }

    #[test]
    fn lists_drawables() {
        let mut scene = SceneGraph::new();
        let cube = DrawableResource::new(
            GeometrySpec::cube(1.0, 1).build().unwrap(),
            Material::default(),
        );
        scene
            .insert(
                scene.root(),
                SceneNode::new("cube")
                    .with_transform(Transform::from_position(Vec3::new(1.0, 2.0, 3.0)))
                    .with_drawable(cube),
            )
            .unwrap();
        let out = configured().draw(&scene, &rig()).unwrap();
        assert!(out.contains("Drawables: 1"));
        assert!(out.contains("cube box tris=12 pos=(1.00, 2.00, 3.00)"));
    }

    #[test]
    fn resize_updates_surface() {
        let mut r = configured();
        r.resize(1920, 1080);
        r.set_pixel_density(2.0);
        let s = r.surface().unwrap();
        assert_eq!((s.width, s.height, s.pixel_density), (1920, 1080, 2.0));
    }

    #[test]
    fn surface_lost_is_recoverable() {
        assert!(!RenderError::SurfaceLost("outdated".into()).is_fatal());
        assert!(RenderError::Fatal("device lost".into()).is_fatal());
    }
}
