use crate::animation::Animator;
use crate::config::RuntimeConfig;
use crate::error::RuntimeError;
use crate::presets::{self, InstalledPreset};
use crate::target::{SceneTarget, StagedGeometry};
use serde::Serialize;
use std::f32::consts::TAU;
use std::time::{Duration, Instant};
use vista_assets::{AssetStore, BatchReport, LoadObserver, Loader, LoadingManager};
use vista_bindings::{ApplyReport, BindingRegistry};
use vista_camera::{CameraRig, InputSample};
use vista_common::{Axis, NodeId, ViewportSize};
use vista_frame::{DisplaySync, FrameLoop, FrameTime, StopHandle, TickTicket};
use vista_input::{Action, HostEvent, InputMapper};
use vista_render::{RenderBinding, RenderError, Renderer};
use vista_scene::{SceneEvent, SceneGraph};
use vista_viewport::{FullscreenCoordinator, FullscreenOutcome, PresentationHost, ViewportTracker};

/// Length of the one-shot spin the panel triggers.
const SPIN_DURATION: Duration = Duration::from_secs(1);

/// What one tick did.
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub time: FrameTime,
    pub mutations: ApplyReport,
    pub rebuilds: usize,
    /// Drawable resources released since the previous tick.
    pub released: usize,
    /// Nodes whose transform an animation wrote this tick.
    pub animated: usize,
    pub projection_updated: bool,
    pub surface_synced: bool,
    pub drawn: bool,
    /// Why the draw was skipped, for recoverable surface errors.
    pub skipped: Option<String>,
    pub rescheduled: bool,
}

/// A completed tick and whatever the renderer produced for it.
#[derive(Debug)]
pub struct Tick<O> {
    pub report: TickReport,
    pub output: Option<O>,
}

/// The explicitly constructed context that owns all scene state and drives
/// the frame loop.
///
/// Event handlers only stage state (viewport size, input deltas, binding
/// mutations). Everything is consumed inside [`on_frame`](Self::on_frame) in
/// a fixed order.
#[derive(Debug)]
pub struct SceneRuntime {
    viewport: ViewportTracker,
    camera: CameraRig,
    scene: SceneGraph,
    bindings: BindingRegistry,
    staged_geometry: StagedGeometry,
    animator: Animator,
    frame_loop: FrameLoop,
    mapper: InputMapper,
    input: InputSample,
    fullscreen: FullscreenCoordinator,
    panel_visible: bool,
    assets: AssetStore,
    loading: LoadingManager,
    preset: Option<InstalledPreset>,
}

impl SceneRuntime {
    /// Empty scene viewed by `camera`.
    pub fn new(viewport: ViewportSize, camera: CameraRig) -> Self {
        Self {
            viewport: ViewportTracker::new(viewport),
            camera,
            scene: SceneGraph::new(),
            bindings: BindingRegistry::new(),
            staged_geometry: StagedGeometry::new(),
            animator: Animator::new(),
            frame_loop: FrameLoop::new(),
            mapper: InputMapper::new(viewport),
            input: InputSample::default(),
            fullscreen: FullscreenCoordinator::new(),
            panel_visible: true,
            assets: AssetStore::new(),
            loading: LoadingManager::new(),
            preset: None,
        }
    }

    /// Camera, viewport and scene preset from `config`. The camera is turned
    /// toward the preset's focus node and bindings are seeded from the freshly
    /// built scene.
    pub fn from_config(config: &RuntimeConfig) -> Result<Self, RuntimeError> {
        let viewport = config.viewport();
        let mut runtime = Self::new(viewport, config.build_camera());
        runtime.viewport.set_max_pixel_ratio(config.render.max_pixel_density);
        let installed = presets::install(
            config.scene.preset,
            &mut runtime.scene,
            &mut runtime.bindings,
            &mut runtime.animator,
        )?;
        let focus = runtime.scene.world_transform(installed.focus)?.w_axis.truncate();
        runtime.camera.look_at(focus);
        runtime.preset = Some(installed);
        runtime.seed_bindings();
        Ok(runtime)
    }

    pub fn viewport(&self) -> &ViewportTracker {
        &self.viewport
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraRig {
        &mut self.camera
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    pub fn bindings(&self) -> &BindingRegistry {
        &self.bindings
    }

    /// Controls call `on_user_input` / `on_commit_input` here; the staged
    /// mutations apply at the next tick.
    pub fn bindings_mut(&mut self) -> &mut BindingRegistry {
        &mut self.bindings
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    pub fn animator_mut(&mut self) -> &mut Animator {
        &mut self.animator
    }

    /// Queue one full turn of `node` about its Y axis, played over the next
    /// second of ticks. Returns false when the node does not exist.
    pub fn spin(&mut self, node: NodeId) -> bool {
        if !self.scene.contains(node) {
            return false;
        }
        self.animator.turn(node, Axis::Y, TAU, SPIN_DURATION);
        true
    }

    /// [`spin`](Self::spin) the preset's focus node.
    pub fn spin_focus(&mut self) -> bool {
        match self.preset.as_ref().map(|p| p.focus) {
            Some(focus) => self.spin(focus),
            None => false,
        }
    }

    pub fn frame_loop(&self) -> &FrameLoop {
        &self.frame_loop
    }

    pub fn fullscreen(&self) -> &FullscreenCoordinator {
        &self.fullscreen
    }

    pub fn panel_visible(&self) -> bool {
        self.panel_visible
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    pub fn preset(&self) -> Option<&InstalledPreset> {
        self.preset.as_ref()
    }

    /// Input gathered since the last tick.
    pub fn pending_input(&self) -> &InputSample {
        &self.input
    }

    /// Refresh every binding's displayed value from the scene and camera.
    pub fn seed_bindings(&mut self) {
        let target = SceneTarget::new(&mut self.scene, &mut self.camera, &mut self.staged_geometry);
        self.bindings.seed_all(&target);
    }

    pub fn start(&mut self, sync: &mut dyn DisplaySync, now: Instant) -> Result<(), RuntimeError> {
        self.frame_loop.start(sync, now)?;
        Ok(())
    }

    pub fn stop(&mut self) {
        self.frame_loop.stop();
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.frame_loop.stop_handle()
    }

    /// Stop the loop, tear down every panel section and release every
    /// drawable in the scene. Returns the number of drawables released.
    pub fn teardown(&mut self) -> usize {
        self.stop();
        let sections: Vec<String> = self.bindings.sections().into_iter().map(String::from).collect();
        for section in &sections {
            self.bindings.release_section(section);
        }
        self.staged_geometry.clear();
        self.animator.clear();
        let root = self.scene.root();
        let children = self.scene.get(root).map(|n| n.children().to_vec()).unwrap_or_default();
        let mut released = 0;
        for child in children {
            match self.scene.remove_child(root, child) {
                Ok(n) => released += n,
                Err(err) => tracing::warn!(%err, "teardown skipped a node"),
            }
        }
        tracing::info!(released, sections = sections.len(), "runtime torn down");
        released
    }

    /// Load one batch of assets into the runtime's store.
    pub async fn load_assets<L: Loader>(
        &mut self,
        loader: &L,
        uris: &[String],
        observer: &mut dyn LoadObserver,
    ) -> BatchReport {
        self.loading
            .load_batch(loader, uris, &mut self.assets, observer)
            .await
    }

    /// Translate a raw host event and handle the resulting actions.
    pub fn handle_event(
        &mut self,
        event: HostEvent,
        now: Instant,
        host: &mut dyn PresentationHost,
    ) -> Option<FullscreenOutcome> {
        let mut outcome = None;
        for action in self.mapper.map(event, now) {
            if let Some(o) = self.handle_action(action, host) {
                outcome = Some(o);
            }
        }
        outcome
    }

    /// Stage one action. Only a fullscreen toggle acts immediately, and its
    /// failures are swallowed.
    pub fn handle_action(
        &mut self,
        action: Action,
        host: &mut dyn PresentationHost,
    ) -> Option<FullscreenOutcome> {
        match action {
            Action::Resize { width, height } => self.viewport.on_resize(width, height),
            Action::DevicePixelRatio(ratio) => self.viewport.on_pixel_ratio(ratio),
            Action::Cursor(pointer) => self.input.pointer = Some(pointer),
            Action::Orbit(delta) => self.input.orbit += delta,
            Action::Pan(delta) => self.input.pan += delta,
            Action::Zoom(steps) => self.input.zoom += steps,
            Action::ToggleFullscreen => return Some(self.fullscreen.toggle_fullscreen(host)),
            Action::HidePanel => self.panel_visible = false,
            Action::ShowPanel => self.panel_visible = true,
            Action::Noop => {}
        }
        None
    }

    /// Run one tick for `ticket`. Returns `Ok(None)` when the ticket is stale
    /// or the loop is idle.
    ///
    /// Order: clock, binding mutations, animations, camera, surface sync and
    /// draw, reschedule. A recoverable surface error skips the draw; a fatal one
    /// halts the loop and is returned.
    pub fn on_frame<R: Renderer>(
        &mut self,
        ticket: TickTicket,
        now: Instant,
        render: &mut RenderBinding<R>,
        sync: &mut dyn DisplaySync,
    ) -> Result<Option<Tick<R::Output>>, RuntimeError> {
        let Some(time) = self.frame_loop.begin_tick(ticket, now) else {
            return Ok(None);
        };
        let span = tracing::debug_span!("tick", frame = time.frame);
        let _guard = span.enter();

        let scene = &self.scene;
        self.staged_geometry.retain(|id, _| scene.contains(*id));
        let mut target = SceneTarget::new(&mut self.scene, &mut self.camera, &mut self.staged_geometry);
        let mutations = self.bindings.apply_pending(&mut target);
        let rebuilds = target.rebuilds;
        let released = self
            .scene
            .drain_events()
            .iter()
            .filter(|e| matches!(e, SceneEvent::ResourceReleased { .. }))
            .count();
        let animated = self.animator.step(&mut self.scene, &time);

        let mut projection_updated = false;
        if self.viewport.take_camera_dirty() || self.camera.projection_dirty() {
            self.camera.update_projection(self.viewport.size());
            projection_updated = true;
        }
        let input = std::mem::take(&mut self.input);
        self.camera.update_pose(&input);

        let mut report = TickReport {
            time,
            mutations,
            rebuilds,
            released,
            animated,
            projection_updated,
            surface_synced: false,
            drawn: false,
            skipped: None,
            rescheduled: false,
        };
        let output = match self.render_frame(render) {
            Ok((synced, output)) => {
                report.surface_synced = synced;
                report.drawn = true;
                Some(output)
            }
            Err(err) if !err.is_fatal() => {
                tracing::warn!(%err, "frame skipped");
                report.skipped = Some(err.to_string());
                None
            }
            Err(err) => {
                self.frame_loop.fail(&err.to_string());
                self.frame_loop.end_tick(sync);
                return Err(err.into());
            }
        };

        report.rescheduled = self.frame_loop.end_tick(sync);
        Ok(Some(Tick { report, output }))
    }

    fn render_frame<R: Renderer>(
        &mut self,
        render: &mut RenderBinding<R>,
    ) -> Result<(bool, R::Output), RenderError> {
        let mut synced = false;
        if self.viewport.renderer_dirty() {
            render.sync_surface(self.viewport.size(), self.viewport.effective_pixel_ratio())?;
            self.viewport.take_renderer_dirty();
            synced = true;
        }
        let output = render.draw(&self.scene, &self.camera)?;
        Ok((synced, output))
    }
}
