use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use vista_camera::{CameraMode, CameraRig, CursorFollow, OrbitControls, Projection};
use vista_common::ViewportSize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("unknown scene preset `{0}`")]
    UnknownPreset(String),
}

/// Everything a host needs to assemble a [`SceneRuntime`](crate::SceneRuntime).
///
/// Every section and field is optional in the file; missing ones take the
/// defaults below.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub render: RenderConfig,
    pub frame: FrameConfig,
    pub scene: SceneConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "vista".into(),
            width: 800,
            height: 600,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraModeKind {
    #[default]
    Orbit,
    CursorFollow,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionKind {
    #[default]
    Perspective,
    Orthographic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Interaction mode; when unset the scene preset chooses.
    pub mode: Option<CameraModeKind>,
    pub projection: ProjectionKind,
    pub fov_degrees: f32,
    pub ortho_half_height: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub damping: f32,
    pub follow_radius: f32,
    pub follow_height: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            mode: None,
            projection: ProjectionKind::Perspective,
            fov_degrees: 75.0,
            ortho_half_height: 1.0,
            near: 0.1,
            far: 100.0,
            position: [0.0, 0.0, 3.0],
            target: [0.0, 0.0, 0.0],
            damping: 0.05,
            follow_radius: 3.0,
            follow_height: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub max_pixel_density: f32,
    /// Linear RGBA.
    pub clear_color: [f32; 4],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_pixel_density: 2.0,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Tick rate of hosts without a display.
    pub headless_fps: u32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self { headless_fps: 60 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenePreset {
    /// Wireframe cube with a debug panel, including a subdivision slider.
    #[default]
    DebugCube,
    /// Three cubes inside a transformed group.
    TransformGroup,
    /// Sphere, plane and torus sharing physical material parameters.
    Materials,
    /// Single cube watched by a cursor-follow camera.
    CursorCube,
}

impl ScenePreset {
    pub const ALL: [ScenePreset; 4] = [
        Self::DebugCube,
        Self::TransformGroup,
        Self::Materials,
        Self::CursorCube,
    ];

    /// Camera mode the preset is built around.
    pub fn camera_mode(self) -> CameraModeKind {
        match self {
            Self::CursorCube => CameraModeKind::CursorFollow,
            Self::DebugCube | Self::TransformGroup | Self::Materials => CameraModeKind::Orbit,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::DebugCube => "debug_cube",
            Self::TransformGroup => "transform_group",
            Self::Materials => "materials",
            Self::CursorCube => "cursor_cube",
        }
    }
}

impl fmt::Display for ScenePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScenePreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownPreset(s.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub preset: ScenePreset,
    /// URIs loaded as one batch at startup.
    pub assets: Vec<String>,
}

impl RuntimeConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        Ok(config.validated())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&text)?;
        tracing::info!(path = %path.display(), preset = %config.scene.preset, "config loaded");
        Ok(config)
    }

    /// `load` when a path is given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Replace unusable values with defaults, logging each replacement.
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        let cam = &mut self.camera;
        let cam_defaults = &defaults.camera;

        if !(cam.near.is_finite() && cam.far.is_finite() && cam.near > 0.0 && cam.far > cam.near) {
            tracing::warn!(near = cam.near, far = cam.far, "invalid clip planes in config, using defaults");
            cam.near = cam_defaults.near;
            cam.far = cam_defaults.far;
        }
        if !(cam.fov_degrees.is_finite() && cam.fov_degrees > 0.0 && cam.fov_degrees < 180.0) {
            tracing::warn!(fov = cam.fov_degrees, "invalid field of view in config, using default");
            cam.fov_degrees = cam_defaults.fov_degrees;
        }
        if !(cam.ortho_half_height.is_finite() && cam.ortho_half_height > 0.0) {
            tracing::warn!(half_height = cam.ortho_half_height, "invalid orthographic bounds in config, using default");
            cam.ortho_half_height = cam_defaults.ortho_half_height;
        }
        if !(0.0..=1.0).contains(&cam.damping) {
            tracing::warn!(damping = cam.damping, "damping outside [0, 1] in config, using default");
            cam.damping = cam_defaults.damping;
        }
        for (name, value, default) in [
            ("follow_radius", &mut cam.follow_radius, cam_defaults.follow_radius),
            ("follow_height", &mut cam.follow_height, cam_defaults.follow_height),
        ] {
            if !value.is_finite() {
                tracing::warn!(field = name, "non-finite camera value in config, using default");
                *value = default;
            }
        }
        if !(self.render.max_pixel_density.is_finite() && self.render.max_pixel_density >= 1.0) {
            tracing::warn!(
                max = self.render.max_pixel_density,
                "max_pixel_density below 1 in config, using default"
            );
            self.render.max_pixel_density = defaults.render.max_pixel_density;
        }
        if self.window.width == 0 || self.window.height == 0 {
            tracing::warn!(
                width = self.window.width,
                height = self.window.height,
                "zero window size in config clamped to 1"
            );
        }
        self
    }

    pub fn viewport(&self) -> ViewportSize {
        ViewportSize::new(self.window.width, self.window.height)
    }

    /// The configured camera mode, or the preset's when none is set.
    pub fn camera_mode(&self) -> CameraModeKind {
        self.camera
            .mode
            .unwrap_or_else(|| self.scene.preset.camera_mode())
    }

    /// Camera rig for this config, already looking at `camera.target`.
    pub fn build_camera(&self) -> CameraRig {
        let c = &self.camera;
        let target = Vec3::from(c.target);
        let mode = match self.camera_mode() {
            CameraModeKind::Orbit => CameraMode::Orbit(OrbitControls::new(target, c.damping)),
            CameraModeKind::CursorFollow => {
                let mut follow = CursorFollow::new(c.follow_radius, c.follow_height);
                follow.focus = target;
                CameraMode::CursorFollow(follow)
            }
        };
        let mut rig = CameraRig::new(mode).with_position(Vec3::from(c.position));
        let projection = match c.projection {
            ProjectionKind::Perspective => Projection::Perspective {
                fov_y: c.fov_degrees.to_radians(),
            },
            ProjectionKind::Orthographic => Projection::Orthographic {
                half_height: c.ortho_half_height,
            },
        };
        // values were validated; a rejection keeps the rig defaults
        let _ = rig.set_projection(projection);
        let _ = rig.set_clip_planes(c.near, c.far);
        rig.look_at(target);
        rig.update_projection(self.viewport());
        rig
    }
}
