use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

/// Upper bound on generated vertices per geometry.
pub const MAX_VERTICES: usize = 4_000_000;

/// Errors from building geometry out of a parameter set.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("{name} must be positive and finite, got {value}")]
    InvalidDimension { name: &'static str, value: f32 },
    #[error("{name} must be at least {min}, got {value}")]
    InvalidSegments {
        name: &'static str,
        value: u32,
        min: u32,
    },
    #[error("triangle soup needs a non-empty multiple of 3 vertices, got {0}")]
    BadTriangleSoup(usize),
    #[error("geometry would need {0} vertices (limit {MAX_VERTICES})")]
    TooManyVertices(usize),
    #[error("parameter {param:?} does not apply to {shape}")]
    UnsupportedParam {
        param: GeometryParam,
        shape: &'static str,
    },
}

/// A tunable geometry parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryParam {
    /// Segment count along every subdivided direction.
    Subdivision,
    Width,
    Height,
    Depth,
    Radius,
    Tube,
}

/// Parameters a geometry is generated from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeometrySpec {
    Box {
        width: f32,
        height: f32,
        depth: f32,
        width_segments: u32,
        height_segments: u32,
        depth_segments: u32,
    },
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    Plane {
        width: f32,
        height: f32,
        width_segments: u32,
        height_segments: u32,
    },
    Torus {
        radius: f32,
        tube: f32,
        radial_segments: u32,
        tubular_segments: u32,
    },
    Triangles {
        positions: Vec<[f32; 3]>,
    },
}

impl GeometrySpec {
    /// Unit cube subdivided `segments` times along each axis.
    pub fn cube(size: f32, segments: u32) -> Self {
        Self::Box {
            width: size,
            height: size,
            depth: size,
            width_segments: segments,
            height_segments: segments,
            depth_segments: segments,
        }
    }

    pub fn shape_name(&self) -> &'static str {
        match self {
            Self::Box { .. } => "box",
            Self::Sphere { .. } => "sphere",
            Self::Plane { .. } => "plane",
            Self::Torus { .. } => "torus",
            Self::Triangles { .. } => "triangles",
        }
    }

    /// Current value of a tunable parameter, if this shape has it.
    pub fn param(&self, param: GeometryParam) -> Option<f64> {
        use GeometryParam as P;
        let v = match (self, param) {
            (Self::Box { width_segments, .. }, P::Subdivision) => *width_segments as f32,
            (Self::Box { width, .. }, P::Width) => *width,
            (Self::Box { height, .. }, P::Height) => *height,
            (Self::Box { depth, .. }, P::Depth) => *depth,
            (Self::Sphere { width_segments, .. }, P::Subdivision) => *width_segments as f32,
            (Self::Sphere { radius, .. }, P::Radius) => *radius,
            (Self::Plane { width_segments, .. }, P::Subdivision) => *width_segments as f32,
            (Self::Plane { width, .. }, P::Width) => *width,
            (Self::Plane { height, .. }, P::Height) => *height,
            (Self::Torus { radial_segments, .. }, P::Subdivision) => *radial_segments as f32,
            (Self::Torus { radius, .. }, P::Radius) => *radius,
            (Self::Torus { tube, .. }, P::Tube) => *tube,
            _ => return None,
        };
        Some(v as f64)
    }

    /// Return a copy with one parameter changed. Validation happens in [`build`](Self::build).
    pub fn with_param(&self, param: GeometryParam, value: f64) -> Result<Self, GeometryError> {
        use GeometryParam as P;
        let segments = value.round().max(0.0) as u32;
        let size = value as f32;
        let mut spec = self.clone();
        match (&mut spec, param) {
            (
                Self::Box {
                    width_segments,
                    height_segments,
                    depth_segments,
                    ..
                },
                P::Subdivision,
            ) => {
                *width_segments = segments;
                *height_segments = segments;
                *depth_segments = segments;
            }
            (Self::Box { width, .. }, P::Width) => *width = size,
            (Self::Box { height, .. }, P::Height) => *height = size,
            (Self::Box { depth, .. }, P::Depth) => *depth = size,
            (
                Self::Sphere {
                    width_segments,
                    height_segments,
                    ..
                },
                P::Subdivision,
            ) => {
                *width_segments = segments;
                *height_segments = segments;
            }
            (Self::Sphere { radius, .. }, P::Radius) => *radius = size,
            (
                Self::Plane {
                    width_segments,
                    height_segments,
                    ..
                },
                P::Subdivision,
            ) => {
                *width_segments = segments;
                *height_segments = segments;
            }
            (Self::Plane { width, .. }, P::Width) => *width = size,
            (Self::Plane { height, .. }, P::Height) => *height = size,
            (
                Self::Torus {
                    radial_segments,
                    tubular_segments,
                    ..
                },
                P::Subdivision,
            ) => {
                *radial_segments = segments;
                *tubular_segments = segments.saturating_mul(2);
            }
            (Self::Torus { radius, .. }, P::Radius) => *radius = size,
            (Self::Torus { tube, .. }, P::Tube) => *tube = size,
            _ => {
                return Err(GeometryError::UnsupportedParam {
                    param,
                    shape: self.shape_name(),
                });
            }
        }
        Ok(spec)
    }

    /// Generate vertex and index buffers.
    pub fn build(&self) -> Result<Geometry, GeometryError> {
        let mut b = Builder::default();
        match self {
            Self::Box {
                width,
                height,
                depth,
                width_segments,
                height_segments,
                depth_segments,
            } => {
                dimension("width", *width)?;
                dimension("height", *height)?;
                dimension("depth", *depth)?;
                segments("width_segments", *width_segments, 1)?;
                segments("height_segments", *height_segments, 1)?;
                segments("depth_segments", *depth_segments, 1)?;
                let (ws, hs, ds) = (*width_segments, *height_segments, *depth_segments);
                let faces = 2 * ((ds as usize + 1) * (hs as usize + 1)
                    + (ws as usize + 1) * (ds as usize + 1)
                    + (ws as usize + 1) * (hs as usize + 1));
                vertex_budget(faces)?;
                let (w, h, d) = (*width, *height, *depth);
                // (u, v, w axes), u/v direction, face extents, grid
                b.box_face([2, 1, 0], -1.0, -1.0, [d, h, w], ds, hs);
                b.box_face([2, 1, 0], 1.0, -1.0, [d, h, -w], ds, hs);
                b.box_face([0, 2, 1], 1.0, 1.0, [w, d, h], ws, ds);
                b.box_face([0, 2, 1], 1.0, -1.0, [w, d, -h], ws, ds);
                b.box_face([0, 1, 2], 1.0, -1.0, [w, h, d], ws, hs);
                b.box_face([0, 1, 2], -1.0, -1.0, [w, h, -d], ws, hs);
            }
            Self::Sphere {
                radius,
                width_segments,
                height_segments,
            } => {
                dimension("radius", *radius)?;
                segments("width_segments", *width_segments, 3)?;
                segments("height_segments", *height_segments, 2)?;
                vertex_budget((*width_segments as usize + 1) * (*height_segments as usize + 1))?;
                b.sphere(*radius, *width_segments, *height_segments);
            }
            Self::Plane {
                width,
                height,
                width_segments,
                height_segments,
            } => {
                dimension("width", *width)?;
                dimension("height", *height)?;
                segments("width_segments", *width_segments, 1)?;
                segments("height_segments", *height_segments, 1)?;
                vertex_budget((*width_segments as usize + 1) * (*height_segments as usize + 1))?;
                b.plane(*width, *height, *width_segments, *height_segments);
            }
            Self::Torus {
                radius,
                tube,
                radial_segments,
                tubular_segments,
            } => {
                dimension("radius", *radius)?;
                dimension("tube", *tube)?;
                segments("radial_segments", *radial_segments, 3)?;
                segments("tubular_segments", *tubular_segments, 3)?;
                vertex_budget(
                    (*radial_segments as usize + 1) * (*tubular_segments as usize + 1),
                )?;
                b.torus(*radius, *tube, *radial_segments, *tubular_segments);
            }
            Self::Triangles { positions } => {
                if positions.is_empty() || positions.len() % 3 != 0 {
                    return Err(GeometryError::BadTriangleSoup(positions.len()));
                }
                vertex_budget(positions.len())?;
                b.soup(positions);
            }
        }
        Ok(Geometry {
            spec: self.clone(),
            positions: b.positions,
            normals: b.normals,
            uvs: b.uvs,
            indices: b.indices,
        })
    }
}

fn dimension(name: &'static str, value: f32) -> Result<(), GeometryError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(GeometryError::InvalidDimension { name, value })
    }
}

fn segments(name: &'static str, value: u32, min: u32) -> Result<(), GeometryError> {
    if value >= min {
        Ok(())
    } else {
        Err(GeometryError::InvalidSegments { name, value, min })
    }
}

fn vertex_budget(count: usize) -> Result<(), GeometryError> {
    if count > MAX_VERTICES {
        Err(GeometryError::TooManyVertices(count))
    } else {
        Ok(())
    }
}

/// Immutable vertex/index data generated from a [`GeometrySpec`].
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    spec: GeometrySpec,
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    indices: Vec<u32>,
}

impl Geometry {
    pub fn spec(&self) -> &GeometrySpec {
        &self.spec
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    pub fn uvs(&self) -> &[[f32; 2]] {
        &self.uvs
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[derive(Default)]
struct Builder {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    indices: Vec<u32>,
}

impl Builder {
    fn push(&mut self, p: [f32; 3], n: [f32; 3], uv: [f32; 2]) {
        self.positions.push(p);
        self.normals.push(n);
        self.uvs.push(uv);
    }

    /// Two triangles per grid cell for a `(cols + 1) x (rows + 1)` vertex grid starting at `start`.
    fn grid_indices(&mut self, start: u32, cols: u32, rows: u32) {
        let stride = cols + 1;
        for iy in 0..rows {
            for ix in 0..cols {
                let a = start + ix + stride * iy;
                let b = start + ix + stride * (iy + 1);
                let c = start + ix + 1 + stride * (iy + 1);
                let d = start + ix + 1 + stride * iy;
                self.indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }
    }

    fn box_face(
        &mut self,
        axes: [usize; 3],
        udir: f32,
        vdir: f32,
        extent: [f32; 3],
        cols: u32,
        rows: u32,
    ) {
        let [u, v, w] = axes;
        let [width, height, depth] = extent;
        let start = self.positions.len() as u32;
        let seg_w = width / cols as f32;
        let seg_h = height / rows as f32;
        let normal_w = if depth > 0.0 { 1.0 } else { -1.0 };
        for iy in 0..=rows {
            let y = iy as f32 * seg_h - height / 2.0;
            for ix in 0..=cols {
                let x = ix as f32 * seg_w - width / 2.0;
                let mut p = [0.0; 3];
                p[u] = x * udir;
                p[v] = y * vdir;
                p[w] = depth / 2.0;
                let mut n = [0.0; 3];
                n[w] = normal_w;
                let uv = [ix as f32 / cols as f32, 1.0 - iy as f32 / rows as f32];
                self.push(p, n, uv);
            }
        }
        self.grid_indices(start, cols, rows);
    }

    fn sphere(&mut self, radius: f32, cols: u32, rows: u32) {
        let stride = cols + 1;
        for iy in 0..=rows {
            let v = iy as f32 / rows as f32;
            for ix in 0..=cols {
                let u = ix as f32 / cols as f32;
                let x = -radius * (u * TAU).cos() * (v * PI).sin();
                let y = radius * (v * PI).cos();
                let z = radius * (u * TAU).sin() * (v * PI).sin();
                let n = glam::Vec3::new(x, y, z).normalize_or_zero();
                self.push([x, y, z], n.to_array(), [u, 1.0 - v]);
            }
        }
        for iy in 0..rows {
            for ix in 0..cols {
                let a = iy * stride + ix + 1;
                let b = iy * stride + ix;
                let c = (iy + 1) * stride + ix;
                let d = (iy + 1) * stride + ix + 1;
                if iy != 0 {
                    self.indices.extend_from_slice(&[a, b, d]);
                }
                if iy != rows - 1 {
                    self.indices.extend_from_slice(&[b, c, d]);
                }
            }
        }
    }

    fn plane(&mut self, width: f32, height: f32, cols: u32, rows: u32) {
        let seg_w = width / cols as f32;
        let seg_h = height / rows as f32;
        for iy in 0..=rows {
            let y = iy as f32 * seg_h - height / 2.0;
            for ix in 0..=cols {
                let x = ix as f32 * seg_w - width / 2.0;
                let uv = [ix as f32 / cols as f32, 1.0 - iy as f32 / rows as f32];
                self.push([x, -y, 0.0], [0.0, 0.0, 1.0], uv);
            }
        }
        self.grid_indices(0, cols, rows);
    }

    fn torus(&mut self, radius: f32, tube: f32, radial: u32, tubular: u32) {
        for j in 0..=radial {
            for i in 0..=tubular {
                let u = i as f32 / tubular as f32 * TAU;
                let v = j as f32 / radial as f32 * TAU;
                let p = glam::Vec3::new(
                    (radius + tube * v.cos()) * u.cos(),
                    (radius + tube * v.cos()) * u.sin(),
                    tube * v.sin(),
                );
                let center = glam::Vec3::new(radius * u.cos(), radius * u.sin(), 0.0);
                let n = (p - center).normalize_or_zero();
                self.push(
                    p.to_array(),
                    n.to_array(),
                    [i as f32 / tubular as f32, j as f32 / radial as f32],
                );
            }
        }
        let stride = tubular + 1;
        for j in 1..=radial {
            for i in 1..=tubular {
                let a = stride * j + i - 1;
                let b = stride * (j - 1) + i - 1;
                let c = stride * (j - 1) + i;
                let d = stride * j + i;
                self.indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }
    }

    fn soup(&mut self, positions: &[[f32; 3]]) {
        for tri in positions.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(glam::Vec3::from_array);
            let n = (b - a).cross(c - a).normalize_or_zero().to_array();
            for p in tri {
                let i = self.positions.len() as u32;
                self.push(*p, n, [0.0, 0.0]);
                self.indices.push(i);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_cube_counts() {
        let g = GeometrySpec::cube(1.0, 1).build().unwrap();
        assert_eq!(g.vertex_count(), 24);
        assert_eq!(g.triangle_count(), 12);
    }

    #[test]
    fn subdivided_cube_counts() {
        let g = GeometrySpec::cube(1.0, 2).build().unwrap();
        assert_eq!(g.vertex_count(), 6 * 9);
        assert_eq!(g.triangle_count(), 6 * 8);
    }

    #[test]
    fn cube_vertices_lie_on_surface() {
        let g = GeometrySpec::cube(2.0, 3).build().unwrap();
        for p in g.positions() {
            let max = p.iter().fold(0.0f32, |m, c| m.max(c.abs()));
            assert!((max - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn indices_in_bounds() {
        let specs = [
            GeometrySpec::cube(1.0, 4),
            GeometrySpec::Sphere {
                radius: 0.5,
                width_segments: 16,
                height_segments: 8,
            },
            GeometrySpec::Plane {
                width: 1.0,
                height: 1.0,
                width_segments: 10,
                height_segments: 10,
            },
            GeometrySpec::Torus {
                radius: 0.3,
                tube: 0.2,
                radial_segments: 20,
                tubular_segments: 45,
            },
        ];
        for spec in specs {
            let g = spec.build().unwrap();
            let n = g.vertex_count() as u32;
            assert!(g.indices().iter().all(|i| *i < n), "{}", spec.shape_name());
            assert_eq!(g.indices().len() % 3, 0);
            assert_eq!(g.normals().len(), g.positions().len());
        }
    }

    #[test]
    fn sphere_poles_skip_degenerate_triangles() {
        let g = GeometrySpec::Sphere {
            radius: 1.0,
            width_segments: 8,
            height_segments: 4,
        }
        .build()
        .unwrap();
        // two full bands + two fan rows
        assert_eq!(g.triangle_count(), 8 * 2 * 2 + 8 * 2);
    }

    #[test]
    fn zero_segments_rejected() {
        let err = GeometrySpec::cube(1.0, 0).build().unwrap_err();
        assert!(matches!(err, GeometryError::InvalidSegments { min: 1, .. }));
    }

    #[test]
    fn negative_size_rejected() {
        let err = GeometrySpec::cube(-1.0, 1).build().unwrap_err();
        assert!(matches!(err, GeometryError::InvalidDimension { .. }));
    }

    #[test]
    fn sphere_needs_three_columns() {
        let err = GeometrySpec::Sphere {
            radius: 1.0,
            width_segments: 2,
            height_segments: 2,
        }
        .build()
        .unwrap_err();
        assert!(matches!(err, GeometryError::InvalidSegments { min: 3, .. }));
    }

    #[test]
    fn triangle_soup() {
        let positions = vec![[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]];
        let g = GeometrySpec::Triangles { positions }.build().unwrap();
        assert_eq!(g.triangle_count(), 1);
        assert_eq!(g.normals()[0], [0.0, 0.0, -1.0]);

        let bad = GeometrySpec::Triangles {
            positions: vec![[0.0; 3]; 4],
        };
        assert_eq!(bad.build().unwrap_err(), GeometryError::BadTriangleSoup(4));
    }

    #[test]
    fn vertex_budget_enforced() {
        let err = GeometrySpec::cube(1.0, 2000).build().unwrap_err();
        assert!(matches!(err, GeometryError::TooManyVertices(_)));
    }

    #[test]
    fn with_param_subdivision() {
        let spec = GeometrySpec::cube(1.0, 2)
            .with_param(GeometryParam::Subdivision, 7.0)
            .unwrap();
        assert_eq!(spec.param(GeometryParam::Subdivision), Some(7.0));
        assert_eq!(spec, GeometrySpec::cube(1.0, 7));
    }

    #[test]
    fn with_param_unsupported() {
        let err = GeometrySpec::cube(1.0, 1)
            .with_param(GeometryParam::Tube, 1.0)
            .unwrap_err();
        assert!(matches!(
            err,
            GeometryError::UnsupportedParam { shape: "box", .. }
        ));
    }
}
