//! Material catalog and UV projection
//!
//! Materials are plain handles. The kernel only tags vertex ranges with a
//! [`MaterialId`]; everything a renderer needs lives in a [`MaterialCatalog`]
//! that callers build (or load) and pass into the shape builders.

use crate::mesh::Mesh;
use crate::{Error, Result};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

/// Opaque material handle stored on vertices and in segment tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct MaterialId(pub u32);

impl std::fmt::Display for MaterialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How texture coordinates are projected onto a mesh
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UvMapping {
    /// Pick a projection from the mesh proportions
    #[default]
    Auto,
    /// Project along `axis`
    Planar { axis: Vec3, scale: f32 },
    /// Wrap around the Z axis
    Cylindrical { scale: f32 },
    /// Latitude/longitude around the origin
    Spherical { scale: f32 },
    /// Blend the three axis projections by vertex normal
    Triplanar { scale: f32 },
}

impl UvMapping {
    /// Return a copy of `mesh` with UVs written to every vertex
    pub fn apply(&self, mesh: &Mesh) -> Mesh {
        match *self {
            UvMapping::Auto => Self::auto_for(mesh).apply(mesh),
            UvMapping::Planar { axis, scale } => {
                let axis = axis.normalize_or(Vec3::Z);
                let up = if axis.z.abs() > 0.9 { Vec3::Y } else { Vec3::Z };
                let right = up.cross(axis).normalize();
                let forward = axis.cross(right).normalize();
                mesh.map_vertices(|v| {
                    let p = v.position;
                    v.with_uv(Vec2::new(p.dot(right), p.dot(forward)) * scale)
                })
            }
            UvMapping::Cylindrical { scale } => mesh.map_vertices(|v| {
                let p = v.position;
                let u = p.y.atan2(p.x) / TAU + 0.5;
                v.with_uv(Vec2::new(u, p.z) * scale)
            }),
            UvMapping::Spherical { scale } => mesh.map_vertices(|v| {
                let p = v.position.normalize_or_zero();
                let u = p.y.atan2(p.x) / TAU + 0.5;
                let w = p.z.clamp(-1.0, 1.0).asin() / PI + 0.5;
                v.with_uv(Vec2::new(u, w) * scale)
            }),
            UvMapping::Triplanar { scale } => {
                let count = mesh.vertex_count();
                let computed = (0..count)
                    .any(|i| mesh.normal_at(i).is_none())
                    .then(|| mesh.compute_normals());
                let weights: Vec<Vec3> = (0..count)
                    .map(|i| {
                        mesh.normal_at(i)
                            .or_else(|| computed.as_ref().and_then(|c| c.vertices()[i].normal))
                            .unwrap_or(Vec3::Z)
                            .abs()
                    })
                    .collect();
                let mut n = weights.into_iter();
                mesh.map_vertices(|v| {
                    let weight = n.next().unwrap_or(Vec3::Z);
                    let p = v.position;
                    let uv = Vec2::new(p.y, p.z) * weight.x
                        + Vec2::new(p.x, p.z) * weight.y
                        + Vec2::new(p.x, p.y) * weight.z;
                    v.with_uv(uv * scale)
                })
            }
        }
    }

    /// Flat meshes get a planar projection, tall ones a cylinder, the rest
    /// are triplanar
    fn auto_for(mesh: &Mesh) -> UvMapping {
        let Some(bounds) = mesh.bounds() else {
            return UvMapping::Triplanar { scale: 1.0 };
        };
        let size = bounds.size();
        let footprint = size.x.max(size.y);
        let aspect = footprint / size.z.max(0.001);
        if aspect > 2.0 {
            UvMapping::Planar { axis: Vec3::Z, scale: 1.0 }
        } else if aspect < 0.5 {
            UvMapping::Cylindrical { scale: 1.0 }
        } else {
            UvMapping::Triplanar { scale: 1.0 }
        }
    }
}

/// A named material entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSpec {
    pub name: String,
    pub id: MaterialId,
    /// Linear RGB base colour
    pub color: Vec3,
    #[serde(default)]
    pub uv: UvMapping,
}

impl MaterialSpec {
    pub fn new(name: impl Into<String>, id: MaterialId) -> Self {
        Self {
            name: name.into(),
            id,
            color: Vec3::splat(0.8),
            uv: UvMapping::Auto,
        }
    }

    pub fn with_color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }

    pub fn with_uv(mut self, uv: UvMapping) -> Self {
        self.uv = uv;
        self
    }
}

/// Explicit table of materials handed to shape builders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialCatalog {
    materials: Vec<MaterialSpec>,
}

impl Default for MaterialCatalog {
    /// A catalog holding a single grey `"default"` material with id 0
    fn default() -> Self {
        Self {
            materials: vec![MaterialSpec::new(Self::DEFAULT, MaterialId(0))],
        }
    }
}

impl MaterialCatalog {
    pub const DEFAULT: &'static str = "default";

    /// An empty catalog
    pub fn empty() -> Self {
        Self { materials: Vec::new() }
    }

    /// Add or replace a material. Names and ids must stay unique.
    pub fn insert(mut self, spec: MaterialSpec) -> Result<Self> {
        if let Some(clash) = self
            .materials
            .iter()
            .find(|m| m.id == spec.id && m.name != spec.name)
        {
            return Err(Error::InvalidParameter(format!(
                "material id {} is already used by {:?}",
                spec.id, clash.name
            )));
        }
        self.materials.retain(|m| m.name != spec.name);
        self.materials.push(spec);
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Result<&MaterialSpec> {
        self.materials
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| Error::UnknownMaterial(name.to_string()))
    }

    pub fn by_id(&self, id: MaterialId) -> Option<&MaterialSpec> {
        self.materials.iter().find(|m| m.id == id)
    }

    /// Resolve a name to its id
    pub fn id(&self, name: &str) -> Result<MaterialId> {
        self.get(name).map(|m| m.id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MaterialSpec> {
        self.materials.iter()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Tag `mesh` with the named material and apply its UV projection
    pub fn paint(&self, mesh: &Mesh, name: &str) -> Result<Mesh> {
        let spec = self.get(name)?;
        Ok(spec.uv.apply(mesh).with_material(spec.id))
    }
}
