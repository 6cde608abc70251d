use glam::Vec2;
use vista_common::ViewportSize;

/// A high-level action produced from host input.
///
/// The runtime routes each action to the Viewport Tracker, the Camera Rig,
/// the Fullscreen Coordinator or the panel state.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// The surface changed size (pixels).
    Resize { width: u32, height: u32 },
    /// The host reported a new device pixel ratio.
    DevicePixelRatio(f32),
    /// Normalised cursor position, see [`normalize_pointer`].
    Cursor(Vec2),
    /// Rotate drag delta in pixels.
    Orbit(Vec2),
    /// Pan drag delta in pixels.
    Pan(Vec2),
    /// Wheel steps; positive zooms in.
    Zoom(f32),
    ToggleFullscreen,
    HidePanel,
    ShowPanel,
    /// Input with no binding.
    Noop,
}

impl Action {
    /// Actions that feed the camera's per-tick input sample.
    pub fn is_camera_input(&self) -> bool {
        matches!(
            self,
            Self::Cursor(_) | Self::Orbit(_) | Self::Pan(_) | Self::Zoom(_)
        )
    }
}

/// Map a pixel position to `[-0.5, 0.5]` on both axes, origin at the centre,
/// y pointing up.
pub fn normalize_pointer(position: Vec2, viewport: ViewportSize) -> Vec2 {
    Vec2::new(
        position.x / viewport.width() as f32 - 0.5,
        -(position.y / viewport.height() as f32 - 0.5),
    )
}
