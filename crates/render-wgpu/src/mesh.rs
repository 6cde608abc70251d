use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use std::collections::BTreeSet;
use vista_render::SurfaceInfo;
use vista_scene::{Geometry, Material, MaterialKind};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub(crate) struct Uniforms {
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
}

impl Uniforms {
    pub fn new(view_proj: Mat4, eye: Vec3) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            eye: eye.extend(1.0).to_array(),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct InstanceData {
    pub model_0: [f32; 4],
    pub model_1: [f32; 4],
    pub model_2: [f32; 4],
    pub model_3: [f32; 4],
    pub color: [f32; 4],
    pub shading: [f32; 4],
}

impl InstanceData {
    pub fn new(world: Mat4, material: &Material) -> Self {
        let cols = world.to_cols_array_2d();
        let kind = match material.kind {
            MaterialKind::Basic => 0.0,
            MaterialKind::Normal => 1.0,
            MaterialKind::Standard => 2.0,
            MaterialKind::Physical => 3.0,
        };
        let transmission = if material.kind == MaterialKind::Physical {
            material.transmission
        } else {
            0.0
        };
        Self {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
            color: material.rgba(),
            shading: [kind, material.metalness, material.roughness, transmission],
        }
    }

    pub fn is_translucent(&self) -> bool {
        self.color[3] < 1.0 || self.shading[3] > 0.0
    }
}

/// Backbuffer size in physical pixels, at least 1x1.
pub(crate) fn backbuffer_size(surface: SurfaceInfo) -> (u32, u32) {
    let scale = |v: u32| ((v as f32 * surface.pixel_density).round() as u32).max(1);
    (scale(surface.width), scale(surface.height))
}

pub(crate) fn vertices(geometry: &Geometry) -> Vec<Vertex> {
    geometry
        .positions()
        .iter()
        .zip(geometry.normals())
        .map(|(p, n)| Vertex {
            position: *p,
            normal: *n,
        })
        .collect()
}

/// Unique triangle edges as a line list.
pub(crate) fn edge_indices(triangles: &[u32]) -> Vec<u32> {
    let mut edges = BTreeSet::new();
    for tri in triangles.chunks_exact(3) {
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            edges.insert((a.min(b), a.max(b)));
        }
    }
    edges.into_iter().flat_map(|(a, b)| [a, b]).collect()
}

/// GPU copy of one drawable resource's geometry.
pub(crate) struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub edge_buffer: wgpu::Buffer,
    pub edge_count: u32,
}

impl GpuMesh {
    pub fn upload(device: &wgpu::Device, label: &str, geometry: &Geometry) -> Self {
        let verts = vertices(geometry);
        let edges = edge_indices(geometry.indices());
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&verts),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(geometry.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });
        let edge_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&edges),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: geometry.indices().len() as u32,
            edge_buffer,
            edge_count: edges.len() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vista_scene::GeometrySpec;

    #[test]
    fn shared_edges_are_emitted_once() {
        // Two triangles sharing the 1-2 edge: 5 unique edges.
        let lines = edge_indices(&[0, 1, 2, 2, 1, 3]);
        assert_eq!(lines.len(), 10);
        assert!(lines.chunks(2).all(|e| e[0] < e[1]));
    }

    #[test]
    fn backbuffer_scales_with_density() {
        let info = SurfaceInfo {
            width: 800,
            height: 600,
            pixel_density: 2.0,
        };
        assert_eq!(backbuffer_size(info), (1600, 1200));
        let tiny = SurfaceInfo {
            width: 1,
            height: 1,
            pixel_density: 0.25,
        };
        assert_eq!(backbuffer_size(tiny), (1, 1));
    }

    #[test]
    fn instance_packs_material() {
        let material = Material {
            transmission: 1.0,
            ..Material::physical(0.5, 0.25)
        };
        let data = InstanceData::new(Mat4::from_translation(Vec3::X), &material);
        assert_eq!(data.model_3, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(data.shading, [3.0, 0.5, 0.25, 1.0]);
        assert!(data.is_translucent());

        let basic = InstanceData::new(Mat4::IDENTITY, &Material::basic(0xff0000));
        assert_eq!(basic.color, [1.0, 0.0, 0.0, 1.0]);
        assert!(!basic.is_translucent());
    }

    #[test]
    fn vertices_follow_geometry() {
        let geometry = GeometrySpec::cube(1.0, 1).build().unwrap();
        let verts = vertices(&geometry);
        assert_eq!(verts.len(), geometry.vertex_count());
        assert_eq!(verts[0].position, geometry.positions()[0]);
    }
}
