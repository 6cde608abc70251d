use crate::geometry::Geometry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_RESOURCE: AtomicU64 = AtomicU64::new(1);

/// Identity of one drawable resource. Never reused within a process, so
/// backends can key GPU buffers on it and drop any id that leaves the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(pub u64);

impl ResourceId {
    fn next() -> Self {
        Self(NEXT_RESOURCE.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "res-{}", self.0)
    }
}

/// Shading model of a [`Material`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MaterialKind {
    /// Unlit flat color.
    #[default]
    Basic,
    /// Color shaded by surface normal.
    Normal,
    /// Metalness/roughness.
    Standard,
    /// Standard plus transmission, ior and thickness.
    Physical,
}

/// Surface description for a drawable.
///
/// Scalar ranges: `opacity`, `metalness`, `roughness` and `transmission` in
/// `[0, 1]`, `ior` in `[1, 2.333]`. Out-of-range writes are clamped by
/// [`Material::sanitize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub kind: MaterialKind,
    /// `0xRRGGBB`.
    pub color: u32,
    pub wireframe: bool,
    pub opacity: f32,
    pub transparent: bool,
    pub metalness: f32,
    pub roughness: f32,
    pub transmission: f32,
    pub ior: f32,
    pub thickness: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            kind: MaterialKind::Basic,
            color: 0xff_00_00,
            wireframe: false,
            opacity: 1.0,
            transparent: false,
            metalness: 0.0,
            roughness: 1.0,
            transmission: 0.0,
            ior: 1.5,
            thickness: 0.0,
        }
    }
}

impl Material {
    pub fn basic(color: u32) -> Self {
        Self {
            color,
            ..Default::default()
        }
    }

    pub fn physical(metalness: f32, roughness: f32) -> Self {
        Self {
            kind: MaterialKind::Physical,
            color: 0xff_ff_ff,
            metalness,
            roughness,
            ..Default::default()
        }
    }

    /// Linear RGBA, alpha is `opacity` when `transparent` else 1.
    pub fn rgba(&self) -> [f32; 4] {
        let c = self.color;
        let ch = |shift: u32| ((c >> shift) & 0xff) as f32 / 255.0;
        let alpha = if self.transparent { self.opacity } else { 1.0 };
        [ch(16), ch(8), ch(0), alpha]
    }

    /// Clamp every scalar into its legal range.
    pub fn sanitize(&mut self) {
        self.color &= 0xff_ff_ff;
        self.opacity = self.opacity.clamp(0.0, 1.0);
        self.metalness = self.metalness.clamp(0.0, 1.0);
        self.roughness = self.roughness.clamp(0.0, 1.0);
        self.transmission = self.transmission.clamp(0.0, 1.0);
        self.ior = self.ior.clamp(1.0, 2.333);
        self.thickness = self.thickness.max(0.0);
    }
}

/// Geometry plus material, owned by exactly one scene node.
///
/// Dropping the value releases it; backends observe the release through
/// [`SceneEvent::ResourceReleased`](crate::SceneEvent::ResourceReleased) or by
/// the id vanishing from the draw list.
#[derive(Debug)]
pub struct DrawableResource {
    id: ResourceId,
    geometry: Geometry,
    material: Material,
}

impl DrawableResource {
    pub fn new(geometry: Geometry, material: Material) -> Self {
        Self {
            id: ResourceId::next(),
            geometry,
            material,
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn material_mut(&mut self) -> &mut Material {
        &mut self.material
    }
}
