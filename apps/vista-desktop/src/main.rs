mod host;
mod panel;

use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use host::{RedrawSync, WindowPresentation};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use vista_assets::{FileLoader, ProgressLog};
use vista_input::HostEvent;
use vista_render::RenderBinding;
use vista_render_wgpu::WgpuRenderer;
use vista_runtime::{RuntimeConfig, SceneRuntime, ScenePreset};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "vista-desktop", about = "Vista scene runtime desktop host")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML runtime configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scene preset, overrides the configuration
    #[arg(short, long)]
    preset: Option<ScenePreset>,

    /// Initial window width in logical pixels
    #[arg(long)]
    width: Option<u32>,

    /// Initial window height in logical pixels
    #[arg(long)]
    height: Option<u32>,

    /// Directory that scene asset URIs resolve against
    #[arg(long, default_value = ".")]
    asset_root: PathBuf,
}

/// Window-bound state, created on the first `resumed`.
struct Gpu {
    window: Arc<Window>,
    render: RenderBinding<WgpuRenderer>,
    sync: RedrawSync,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

struct App {
    config: RuntimeConfig,
    runtime: SceneRuntime,
    egui_ctx: EguiContext,
    gpu: Option<Gpu>,
    failure: Option<anyhow::Error>,
}

impl App {
    fn new(config: RuntimeConfig, runtime: SceneRuntime) -> Self {
        Self {
            config,
            runtime,
            egui_ctx: EguiContext::default(),
            gpu: None,
            failure: None,
        }
    }

    fn init_gpu(&self, event_loop: &ActiveEventLoop) -> Result<Gpu> {
        let attrs = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        let window = Arc::new(event_loop.create_window(attrs).context("creating window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .context("creating surface")?;
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no compatible GPU adapter")?;
        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("vista_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("creating device")?;
        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            adapter = adapter.get_info().name,
            "GPU initialized"
        );

        let renderer = WgpuRenderer::new(surface, &adapter, device, queue)
            .with_clear_color(self.config.render.clear_color);
        let egui_renderer = egui_wgpu::Renderer::new(
            renderer.device(),
            renderer.surface_format(),
            None,
            1,
            false,
        );
        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        Ok(Gpu {
            sync: RedrawSync::new(window.clone()),
            render: RenderBinding::new(renderer, self.config.render.max_pixel_density),
            window,
            egui_winit,
            egui_renderer,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        tracing::error!("{error:#}");
        self.failure = Some(error);
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        let Some(ticket) = gpu.sync.take_pending() else {
            return;
        };
        let tick = match self
            .runtime
            .on_frame(ticket, Instant::now(), &mut gpu.render, &mut gpu.sync)
        {
            Ok(Some(tick)) => tick,
            Ok(None) => return,
            Err(err) => {
                self.fail(event_loop, anyhow::Error::new(err).context("frame loop halted"));
                return;
            }
        };
        let Some(frame) = tick.output else {
            return;
        };

        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let runtime = &mut self.runtime;
        let full_output = self.egui_ctx.run(raw_input, |ctx| panel::draw(ctx, runtime));
        gpu.egui_winit
            .handle_platform_output(&gpu.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let (width, height) = frame.size();
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [width, height],
            pixels_per_point: full_output.pixels_per_point,
        };

        let device = gpu.render.renderer().device();
        let queue = gpu.render.renderer().queue();
        for (id, image_delta) in &full_output.textures_delta.set {
            gpu.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("egui_encoder"),
        });
        gpu.egui_renderer
            .update_buffers(device, queue, &mut encoder, &paint_jobs, &screen_descriptor);
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: frame.view(),
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            gpu.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }

        frame.present();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        let mut gpu = match self.init_gpu(event_loop) {
            Ok(gpu) => gpu,
            Err(err) => {
                self.fail(event_loop, err);
                return;
            }
        };

        // Seed the viewport with the real window metrics before the first tick.
        let scale = gpu.window.scale_factor();
        let size = gpu.window.inner_size().to_logical::<f64>(scale);
        let mut presentation = WindowPresentation::new(&gpu.window);
        let now = Instant::now();
        self.runtime
            .handle_event(HostEvent::ScaleFactorChanged(scale), now, &mut presentation);
        self.runtime.handle_event(
            HostEvent::Resized {
                width: size.width.round() as u32,
                height: size.height.round() as u32,
            },
            now,
            &mut presentation,
        );

        if let Err(err) = self.runtime.start(&mut gpu.sync, now) {
            self.fail(event_loop, err.into());
            return;
        }
        self.gpu = Some(gpu);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        let consumed = gpu.egui_winit.on_window_event(&gpu.window, &event).consumed;

        match event {
            WindowEvent::CloseRequested => {
                let released = self.runtime.teardown();
                tracing::info!(released, "window closed");
                event_loop.exit();
                return;
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                return;
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {}
            _ if consumed => return,
            _ => {}
        }

        if let Some(host_event) = host::host_event(&event, gpu.window.scale_factor()) {
            let mut presentation = WindowPresentation::new(&gpu.window);
            if let Some(outcome) = self
                .runtime
                .handle_event(host_event, Instant::now(), &mut presentation)
            {
                tracing::info!(?outcome, "fullscreen toggled");
            }
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    tracing::info!("vista-desktop starting");

    let mut config = RuntimeConfig::load_or_default(cli.config.as_deref())
        .context("loading runtime configuration")?
        .validated();
    if let Some(preset) = cli.preset {
        config.scene.preset = preset;
    }
    if let Some(width) = cli.width {
        config.window.width = width.max(1);
    }
    if let Some(height) = cli.height {
        config.window.height = height.max(1);
    }

    let mut runtime = SceneRuntime::from_config(&config)?;
    if !config.scene.assets.is_empty() {
        let loader = FileLoader::new(cli.asset_root);
        let report = pollster::block_on(runtime.load_assets(&loader, &config.scene.assets, &mut ProgressLog));
        for (uri, reason) in &report.failed {
            tracing::warn!(uri, reason, "asset unavailable");
        }
    }

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config, runtime);
    event_loop.run_app(&mut app)?;

    match app.failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
