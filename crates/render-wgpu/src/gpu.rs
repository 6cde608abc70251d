use crate::mesh::{GpuMesh, InstanceData, Uniforms, Vertex, backbuffer_size};
use crate::shaders;
use glam::Mat4;
use std::collections::{HashMap, HashSet};
use vista_camera::CameraRig;
use vista_render::{RenderError, Renderer, SurfaceInfo};
use vista_scene::{ResourceId, SceneGraph};
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// A drawn but not yet presented surface frame.
///
/// Hosts may record more passes into `view` (a UI overlay, say) before
/// calling [`RenderedFrame::present`].
pub struct RenderedFrame {
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    draws: usize,
    size: (u32, u32),
}

impl RenderedFrame {
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Drawables submitted this frame.
    pub fn draws(&self) -> usize {
        self.draws
    }

    /// Backbuffer size in physical pixels.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn present(self) {
        self.texture.present();
    }
}

/// wgpu-based scene renderer.
pub struct WgpuRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    logical: Option<SurfaceInfo>,
    solid_pipeline: wgpu::RenderPipeline,
    translucent_pipeline: wgpu::RenderPipeline,
    wire_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    instance_buffer: wgpu::Buffer,
    instance_capacity: u64,
    depth_texture: Option<wgpu::TextureView>,
    meshes: HashMap<ResourceId, GpuMesh>,
    clear_color: wgpu::Color,
}

struct PipelineDesc<'a> {
    label: &'a str,
    shader: &'a wgpu::ShaderModule,
    vs: &'a str,
    fs: &'a str,
    topology: wgpu::PrimitiveTopology,
    blend: wgpu::BlendState,
    depth_write: bool,
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    desc: PipelineDesc<'_>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: desc.shader,
            entry_point: Some(desc.vs),
            compilation_options: Default::default(),
            buffers: &[
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x3,
                    ],
                },
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<InstanceData>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &wgpu::vertex_attr_array![
                        2 => Float32x4,
                        3 => Float32x4,
                        4 => Float32x4,
                        5 => Float32x4,
                        6 => Float32x4,
                        7 => Float32x4,
                    ],
                },
            ],
        },
        fragment: Some(wgpu::FragmentState {
            module: desc.shader,
            entry_point: Some(desc.fs),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(desc.blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: desc.topology,
            // Planes are single sided; show both faces.
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: desc.depth_write,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

impl WgpuRenderer {
    /// Build pipelines for `surface`. Nothing is drawn until the surface is
    /// configured through [`Renderer::configure`].
    pub fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        device: wgpu::Device,
        queue: wgpu::Queue,
    ) -> Self {
        let caps = surface.get_capabilities(adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| caps.formats.first().copied())
            .unwrap_or(wgpu::TextureFormat::Bgra8UnormSrgb);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: 1,
            height: 1,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents: bytemuck::bytes_of(&Uniforms::new(Mat4::IDENTITY, glam::Vec3::ZERO)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let scene_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
        });
        let wire_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("wire_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::WIREFRAME_SHADER.into()),
        });

        let solid_pipeline = create_pipeline(
            &device,
            &layout,
            format,
            PipelineDesc {
                label: "solid_pipeline",
                shader: &scene_shader,
                vs: "vs_main",
                fs: "fs_main",
                topology: wgpu::PrimitiveTopology::TriangleList,
                blend: wgpu::BlendState::REPLACE,
                depth_write: true,
            },
        );
        let translucent_pipeline = create_pipeline(
            &device,
            &layout,
            format,
            PipelineDesc {
                label: "translucent_pipeline",
                shader: &scene_shader,
                vs: "vs_main",
                fs: "fs_main",
                topology: wgpu::PrimitiveTopology::TriangleList,
                blend: wgpu::BlendState::ALPHA_BLENDING,
                depth_write: false,
            },
        );
        let wire_pipeline = create_pipeline(
            &device,
            &layout,
            format,
            PipelineDesc {
                label: "wire_pipeline",
                shader: &wire_shader,
                vs: "vs_wire",
                fs: "fs_wire",
                topology: wgpu::PrimitiveTopology::LineList,
                blend: wgpu::BlendState::ALPHA_BLENDING,
                depth_write: true,
            },
        );

        let instance_capacity = 64;
        let instance_buffer = Self::create_instance_buffer(&device, instance_capacity);

        Self {
            surface,
            device,
            queue,
            config,
            logical: None,
            solid_pipeline,
            translucent_pipeline,
            wire_pipeline,
            uniform_buffer,
            uniform_bind_group,
            instance_buffer,
            instance_capacity,
            depth_texture: None,
            meshes: HashMap::new(),
            clear_color: wgpu::Color::BLACK,
        }
    }

    pub fn with_clear_color(mut self, rgba: [f32; 4]) -> Self {
        self.clear_color = wgpu::Color {
            r: f64::from(rgba[0]),
            g: f64::from(rgba[1]),
            b: f64::from(rgba[2]),
            a: f64::from(rgba[3]),
        };
        self
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Backbuffer size in physical pixels.
    pub fn backbuffer_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Meshes currently resident on the GPU.
    pub fn cached_meshes(&self) -> usize {
        self.meshes.len()
    }

    fn create_instance_buffer(device: &wgpu::Device, capacity: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size: capacity * std::mem::size_of::<InstanceData>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }

    /// Push the logical size times density to the swapchain and depth buffer.
    fn apply_surface(&mut self) {
        let Some(logical) = self.logical else {
            return;
        };
        let max = self.device.limits().max_texture_dimension_2d;
        let (width, height) = backbuffer_size(logical);
        self.config.width = width.min(max);
        self.config.height = height.min(max);
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = Some(Self::create_depth_texture(
            &self.device,
            self.config.width,
            self.config.height,
        ));
        tracing::debug!(
            width = self.config.width,
            height = self.config.height,
            density = logical.pixel_density,
            "surface configured"
        );
    }

    /// Upload meshes for new resources and drop those no longer installed.
    fn sync_meshes(&mut self, scene: &SceneGraph) {
        let live: HashSet<ResourceId> = scene.installed_resources().into_iter().collect();
        let before = self.meshes.len();
        self.meshes.retain(|id, _| live.contains(id));
        let dropped = before - self.meshes.len();

        let mut uploaded = 0;
        for item in scene.draw_list() {
            let id = item.drawable.id();
            if !self.meshes.contains_key(&id) {
                let mesh = GpuMesh::upload(&self.device, &id.to_string(), item.drawable.geometry());
                self.meshes.insert(id, mesh);
                uploaded += 1;
            }
        }
        if uploaded > 0 || dropped > 0 {
            tracing::debug!(uploaded, dropped, resident = self.meshes.len(), "mesh cache updated");
        }
    }

    fn write_instances(&mut self, instances: &[InstanceData]) {
        let needed = instances.len() as u64;
        if needed > self.instance_capacity {
            self.instance_capacity = needed.next_power_of_two();
            self.instance_buffer = Self::create_instance_buffer(&self.device, self.instance_capacity);
        }
        if !instances.is_empty() {
            self.queue
                .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(instances));
        }
    }

    fn acquire(&mut self) -> Result<wgpu::SurfaceTexture, RenderError> {
        match self.surface.get_current_texture() {
            Ok(texture) => Ok(texture),
            Err(e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                self.surface.configure(&self.device, &self.config);
                Err(RenderError::SurfaceLost(e.to_string()))
            }
            Err(e @ wgpu::SurfaceError::Timeout) => Err(RenderError::SurfaceLost(e.to_string())),
            Err(e) => Err(RenderError::Fatal(e.to_string())),
        }
    }
}

impl Renderer for WgpuRenderer {
    type Output = RenderedFrame;

    fn configure(&mut self, surface: SurfaceInfo) -> Result<(), RenderError> {
        self.logical = Some(surface);
        self.apply_surface();
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if let Some(logical) = self.logical.as_mut() {
            logical.width = width;
            logical.height = height;
        }
        self.apply_surface();
    }

    fn set_pixel_density(&mut self, ratio: f32) {
        if let Some(logical) = self.logical.as_mut() {
            logical.pixel_density = ratio;
        }
        self.apply_surface();
    }

    fn draw(&mut self, scene: &SceneGraph, camera: &CameraRig) -> Result<RenderedFrame, RenderError> {
        if self.logical.is_none() {
            return Err(RenderError::NotConfigured);
        }
        let texture = self.acquire()?;

        self.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms::new(camera.view_projection(), camera.pose().position)),
        );

        self.sync_meshes(scene);
        let items = scene.draw_list();
        let instances: Vec<InstanceData> = items
            .iter()
            .map(|item| InstanceData::new(item.world, item.drawable.material()))
            .collect();
        self.write_instances(&instances);

        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let Some(depth) = self.depth_texture.as_ref() else {
            return Err(RenderError::NotConfigured);
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scene_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));

            // Opaque first, then translucent over the filled depth buffer.
            let mut order: Vec<usize> = (0..items.len()).collect();
            order.sort_by_key(|&i| instances[i].is_translucent());

            for i in order {
                let item = &items[i];
                let resource = item.drawable.id();
                let mesh = self.meshes.get(&resource).ok_or_else(|| RenderError::InvalidResource {
                    resource,
                    reason: "mesh missing from cache".into(),
                })?;
                let instance = i as u32..i as u32 + 1;
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                if item.drawable.material().wireframe {
                    if mesh.edge_count == 0 {
                        continue;
                    }
                    pass.set_pipeline(&self.wire_pipeline);
                    pass.set_index_buffer(mesh.edge_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..mesh.edge_count, 0, instance);
                } else {
                    if mesh.index_count == 0 {
                        continue;
                    }
                    let pipeline = if instances[i].is_translucent() {
                        &self.translucent_pipeline
                    } else {
                        &self.solid_pipeline
                    };
                    pass.set_pipeline(pipeline);
                    pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..mesh.index_count, 0, instance);
                }
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        tracing::trace!(draws = items.len(), "scene frame submitted");

        Ok(RenderedFrame {
            texture,
            view,
            draws: items.len(),
            size: (self.config.width, self.config.height),
        })
    }
}
