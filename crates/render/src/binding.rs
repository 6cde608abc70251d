use crate::renderer::{RenderError, Renderer, SurfaceInfo};
use vista_camera::CameraRig;
use vista_common::ViewportSize;
use vista_scene::SceneGraph;

/// Thin adapter that owns a [`Renderer`] and keeps its surface in step with
/// the viewport.
#[derive(Debug)]
pub struct RenderBinding<R: Renderer> {
    renderer: R,
    surface: Option<SurfaceInfo>,
    max_pixel_density: f32,
    draw_calls: u64,
}

impl<R: Renderer> RenderBinding<R> {
    pub fn new(renderer: R, max_pixel_density: f32) -> Self {
        Self {
            renderer,
            surface: None,
            max_pixel_density: max_pixel_density.max(1.0),
            draw_calls: 0,
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn surface(&self) -> Option<SurfaceInfo> {
        self.surface
    }

    /// Draw calls issued through this binding, failed ones included.
    pub fn draw_calls(&self) -> u64 {
        self.draw_calls
    }

    /// Push size and density to the renderer. The first call configures it.
    pub fn sync_surface(
        &mut self,
        viewport: ViewportSize,
        device_pixel_ratio: f32,
    ) -> Result<(), RenderError> {
        let density = device_pixel_ratio.min(self.max_pixel_density);
        let next = SurfaceInfo {
            width: viewport.width(),
            height: viewport.height(),
            pixel_density: density,
        };
        match self.surface {
            None => {
                self.renderer.configure(next)?;
                tracing::debug!(width = next.width, height = next.height, density, "renderer configured");
            }
            Some(current) => {
                if (current.width, current.height) != (next.width, next.height) {
                    self.renderer.resize(next.width, next.height);
                }
                if current.pixel_density != density {
                    self.renderer.set_pixel_density(density);
                }
            }
        }
        self.surface = Some(next);
        Ok(())
    }

    /// Issue one draw with the current scene and camera.
    pub fn draw(&mut self, scene: &SceneGraph, camera: &CameraRig) -> Result<R::Output, RenderError> {
        if self.surface.is_none() {
            return Err(RenderError::NotConfigured);
        }
        self.draw_calls += 1;
        self.renderer.draw(scene, camera)
    }
}
