use vista_common::ViewportSize;

/// Device pixel ratios above this are capped before reaching the renderer.
pub const DEFAULT_MAX_PIXEL_RATIO: f32 = 2.0;

/// Owns the current surface size and pixel ratio.
#[derive(Debug, Clone)]
pub struct ViewportTracker {
    size: ViewportSize,
    pixel_ratio: f32,
    max_pixel_ratio: f32,
    camera_dirty: bool,
    renderer_dirty: bool,
}

impl Default for ViewportTracker {
    fn default() -> Self {
        Self::new(ViewportSize::default())
    }
}

impl ViewportTracker {
    /// Start at `size`. Both consumers begin dirty so the first tick syncs them.
    pub fn new(size: ViewportSize) -> Self {
        Self {
            size,
            pixel_ratio: 1.0,
            max_pixel_ratio: DEFAULT_MAX_PIXEL_RATIO,
            camera_dirty: true,
            renderer_dirty: true,
        }
    }

    pub fn size(&self) -> ViewportSize {
        self.size
    }

    /// Record a new surface size. Zero on either axis is clamped to 1.
    pub fn on_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            tracing::warn!(width, height, "zero-sized viewport clamped to 1");
        }
        self.size = ViewportSize::new(width, height);
        self.camera_dirty = true;
        self.renderer_dirty = true;
        tracing::debug!(
            width = self.size.width(),
            height = self.size.height(),
            "viewport resized"
        );
    }

    /// Record the host's device pixel ratio. Non-finite or non-positive values
    /// are ignored.
    pub fn on_pixel_ratio(&mut self, ratio: f32) {
        if !(ratio.is_finite() && ratio > 0.0) {
            tracing::warn!(ratio, kept = self.pixel_ratio, "rejected device pixel ratio");
            return;
        }
        if ratio != self.pixel_ratio {
            self.pixel_ratio = ratio;
            self.renderer_dirty = true;
        }
    }

    pub fn set_max_pixel_ratio(&mut self, max: f32) {
        if max.is_finite() && max >= 1.0 {
            self.max_pixel_ratio = max;
            self.renderer_dirty = true;
        } else {
            tracing::warn!(max, kept = self.max_pixel_ratio, "rejected pixel ratio cap");
        }
    }

    /// Raw ratio reported by the host.
    pub fn device_pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Ratio the renderer should use: the device ratio capped at the maximum.
    pub fn effective_pixel_ratio(&self) -> f32 {
        self.pixel_ratio.min(self.max_pixel_ratio)
    }

    pub fn camera_dirty(&self) -> bool {
        self.camera_dirty
    }

    pub fn renderer_dirty(&self) -> bool {
        self.renderer_dirty
    }

    /// Clear and return the camera flag.
    pub fn take_camera_dirty(&mut self) -> bool {
        std::mem::take(&mut self.camera_dirty)
    }

    /// Clear and return the renderer flag.
    pub fn take_renderer_dirty(&mut self) -> bool {
        std::mem::take(&mut self.renderer_dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_dirty() {
        let mut t = ViewportTracker::default();
        assert!(t.take_camera_dirty());
        assert!(t.take_renderer_dirty());
        assert!(!t.camera_dirty());
        assert!(!t.renderer_dirty());
    }

    #[test]
    fn resize_marks_both_dirty() {
        let mut t = ViewportTracker::default();
        t.take_camera_dirty();
        t.take_renderer_dirty();
        t.on_resize(1920, 1080);
        assert_eq!(t.size(), ViewportSize::new(1920, 1080));
        assert!(t.camera_dirty());
        assert!(t.renderer_dirty());
    }

    #[test]
    fn zero_resize_clamps() {
        let mut t = ViewportTracker::default();
        t.on_resize(0, 0);
        assert_eq!((t.size().width(), t.size().height()), (1, 1));
        assert_eq!(t.size().aspect(), 1.0);
        t.on_resize(640, 0);
        assert_eq!(t.size().aspect(), 640.0);
    }

    #[test]
    fn pixel_ratio_capped() {
        let mut t = ViewportTracker::default();
        t.take_renderer_dirty();
        t.on_pixel_ratio(3.0);
        assert!(t.take_renderer_dirty());
        assert_eq!(t.device_pixel_ratio(), 3.0);
        assert_eq!(t.effective_pixel_ratio(), 2.0);

        t.on_pixel_ratio(3.0);
        assert!(!t.renderer_dirty());
        t.on_pixel_ratio(-1.0);
        assert_eq!(t.device_pixel_ratio(), 3.0);
    }

    #[test]
    fn pixel_ratio_only_touches_renderer() {
        let mut t = ViewportTracker::default();
        t.take_camera_dirty();
        t.on_pixel_ratio(1.5);
        assert!(!t.camera_dirty());
        assert!(t.renderer_dirty());
    }
}
