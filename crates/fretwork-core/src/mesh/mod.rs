//! Immutable meshes and the algebra over them
//!
//! A [`Mesh`] is a value: every operation returns a new mesh and leaves its
//! input untouched, so meshes can be shared freely between threads and
//! builders.

mod normals;
mod raycast;
mod segments;
mod weld;

use crate::bounds::Aabb;
use crate::material::MaterialId;
use crate::transform;
use crate::{Error, Result};
use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::ops::Add;

pub use raycast::MeshHit;
pub use segments::{MaterialPart, Segment};

/// A vertex with a mandatory position and optional attributes
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Option<Vec3>,
    pub color: Option<Vec3>,
    pub material: Option<MaterialId>,
    pub uv: Option<Vec2>,
}

impl Vertex {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_normal(mut self, normal: Vec3) -> Self {
        self.normal = Some(normal);
        self
    }

    pub fn with_color(mut self, color: Vec3) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_uv(mut self, uv: Vec2) -> Self {
        self.uv = Some(uv);
        self
    }
}

/// How indices group vertices into primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    /// Every index is a point
    Points,
    /// Every two indices form a line
    Lines,
    /// Every three indices form a triangle
    #[default]
    Triangles,
}

impl Topology {
    /// Number of indices per primitive
    pub fn arity(self) -> usize {
        match self {
            Topology::Points => 1,
            Topology::Lines => 2,
            Topology::Triangles => 3,
        }
    }
}

/// An indexed mesh with a cached bounding box and optional segment tables
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    topology: Topology,
    bounds: Option<Aabb>,
    materials: Option<Vec<Segment<MaterialId>>>,
    normals: Option<Vec<Segment<Vec3>>>,
}

impl Mesh {
    /// Build a mesh, checking index range and arity
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>, topology: Topology) -> Result<Self> {
        if u32::try_from(vertices.len()).is_err() {
            return Err(Error::InvalidMesh(format!(
                "{} vertices exceed the u32 index range",
                vertices.len()
            )));
        }
        if indices.len() % topology.arity() != 0 {
            return Err(Error::InvalidMesh(format!(
                "{} indices do not group into {:?} of arity {}",
                indices.len(),
                topology,
                topology.arity()
            )));
        }
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(Error::InvalidMesh(format!(
                "index {bad} out of range for {} vertices",
                vertices.len()
            )));
        }
        Ok(Self::from_parts(vertices, indices, topology))
    }

    /// Assemble a mesh whose invariants the caller already guarantees
    pub(crate) fn from_parts(vertices: Vec<Vertex>, indices: Vec<u32>, topology: Topology) -> Self {
        let bounds = Aabb::from_points(vertices.iter().map(|v| v.position));
        Self {
            vertices,
            indices,
            topology,
            bounds,
            materials: None,
            normals: None,
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Bounding box of all vertex positions, `None` for an empty mesh
    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    /// Get number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Number of points, lines or triangles
    pub fn primitive_count(&self) -> usize {
        self.indices.len() / self.topology.arity()
    }

    /// Get number of triangles (zero unless the topology is triangles)
    pub fn triangle_count(&self) -> usize {
        match self.topology {
            Topology::Triangles => self.indices.len() / 3,
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Index groups, one slice per primitive
    pub fn primitives(&self) -> std::slice::ChunksExact<'_, u32> {
        self.indices.chunks_exact(self.topology.arity())
    }

    pub(crate) fn position(&self, index: u32) -> Vec3 {
        self.vertices[index as usize].position
    }

    // ========================================================================
    // Vertex transforms
    // ========================================================================

    /// Map every vertex through `f`. Indices and segment tables are kept.
    pub fn map_vertices<F: FnMut(&Vertex) -> Vertex>(&self, f: F) -> Self {
        let vertices = self.vertices.iter().map(f).collect();
        let mut mesh = Self::from_parts(vertices, self.indices.clone(), self.topology);
        mesh.materials.clone_from(&self.materials);
        mesh.normals.clone_from(&self.normals);
        mesh
    }

    /// Apply a homogeneous transform to every position: `(M·[p,1]).xyz / w`.
    ///
    /// Normals follow the inverse-transpose. A matrix that is not invertible
    /// collapses space, so normals are dropped instead of transformed.
    /// Transforms with a negative determinant mirror the geometry; use
    /// [`Mesh::orient_towards`] afterwards if face orientation matters.
    pub fn transform(&self, m: &Mat4) -> Result<Self> {
        let mut positions = Vec::with_capacity(self.vertices.len());
        for v in &self.vertices {
            let p = transform::project(m, v.position).ok_or_else(|| {
                Error::DegenerateGeometry(format!(
                    "transform sends vertex {:?} to infinity (w = 0)",
                    v.position
                ))
            })?;
            positions.push(p);
        }

        let inverse = (m.determinant().abs() > f32::EPSILON).then(|| m.inverse());
        let vertices = self
            .vertices
            .iter()
            .zip(positions)
            .map(|(v, position)| Vertex {
                position,
                normal: inverse
                    .as_ref()
                    .and_then(|inv| v.normal.map(|n| transform::transform_normal(inv, n))),
                ..*v
            })
            .collect();

        let mut mesh = Self::from_parts(vertices, self.indices.clone(), self.topology);
        mesh.materials.clone_from(&self.materials);
        mesh.normals = inverse.as_ref().and_then(|inv| {
            self.normals.as_ref().map(|table| {
                table
                    .iter()
                    .map(|s| Segment::new(transform::transform_normal(inv, s.value), s.end))
                    .collect()
            })
        });
        Ok(mesh)
    }

    /// Compose `transforms` in application order and apply them once
    pub fn apply_transforms(&self, transforms: &[Mat4]) -> Result<Self> {
        self.transform(&transform::compose(transforms))
    }

    /// Uniformly scale and translate so the bounds start at the origin and
    /// fit inside `size`. Axes with zero extent do not constrain the scale.
    pub fn fit_in(&self, size: Vec3) -> Result<Self> {
        let Some(bounds) = self.bounds else {
            return Ok(self.clone());
        };
        let extent = bounds.size();
        let scale = (0..3)
            .filter(|&axis| extent[axis] > 0.0)
            .map(|axis| size[axis] / extent[axis])
            .fold(f32::INFINITY, f32::min);
        let scale = if scale.is_finite() { scale } else { 1.0 };

        self.apply_transforms(&[
            Mat4::from_translation(-bounds.min),
            Mat4::from_scale(Vec3::splat(scale)),
        ])
    }

    /// Stretch each axis independently so the bounds match `target` exactly.
    ///
    /// An axis with zero extent keeps a scale of 1 and is only translated.
    pub fn stretch_to(&self, target: &Aabb) -> Result<Self> {
        let Some(bounds) = self.bounds else {
            return Ok(self.clone());
        };
        let extent = bounds.size();
        let wanted = target.size();
        let scale = Vec3::select(extent.cmpeq(Vec3::ZERO), Vec3::ONE, wanted / extent);

        self.apply_transforms(&[
            Mat4::from_translation(-bounds.min),
            Mat4::from_scale(scale),
            Mat4::from_translation(target.min),
        ])
    }

    // ========================================================================
    // Topology
    // ========================================================================

    /// Convert to another topology.
    ///
    /// Triangles explode into their three edges (shared edges appear once per
    /// triangle). Any mesh converts to points, one index per vertex.
    /// Rebuilding triangles from lines or points is not supported.
    pub fn convert_to(&self, topology: Topology) -> Result<Self> {
        let indices = self.lowered_indices(topology).ok_or(Error::UnsupportedConversion {
            from: self.topology,
            to: topology,
        })?;

        let mut mesh = Self::from_parts(self.vertices.clone(), indices, topology);
        mesh.materials.clone_from(&self.materials);
        mesh.normals.clone_from(&self.normals);
        Ok(mesh)
    }

    /// Indices re-grouped for `topology`, `None` when that needs more
    /// indices per primitive than this mesh has
    fn lowered_indices(&self, topology: Topology) -> Option<Vec<u32>> {
        match (self.topology, topology) {
            (from, to) if from == to => Some(self.indices.clone()),
            (_, Topology::Points) => Some((0..self.vertices.len() as u32).collect()),
            (Topology::Triangles, Topology::Lines) => Some(
                self.indices
                    .chunks_exact(3)
                    .flat_map(|t| [t[0], t[1], t[1], t[2], t[2], t[0]])
                    .collect(),
            ),
            _ => None,
        }
    }
}

impl Add for Mesh {
    type Output = Mesh;

    /// Concatenate two meshes, offsetting `rhs` indices by `self.vertex_count()`.
    ///
    /// Segment tables are not carried over; combine multi-material meshes with
    /// [`Mesh::recombine`]. An empty side adopts the other side's topology.
    /// When the topologies differ, the side with more indices per primitive is
    /// lowered first (triangles to edges, anything to points), so the sum
    /// always has the simpler of the two topologies.
    fn add(self, rhs: Mesh) -> Mesh {
        let topology = match (self.is_empty(), rhs.is_empty()) {
            (true, _) => rhs.topology,
            (_, true) => self.topology,
            _ if rhs.topology.arity() < self.topology.arity() => rhs.topology,
            _ => self.topology,
        };

        // An empty side has no indices to lower
        let offset = self.vertices.len() as u32;
        let mut indices = self.lowered_indices(topology).unwrap_or_default();
        indices.extend(
            rhs.lowered_indices(topology)
                .unwrap_or_default()
                .into_iter()
                .map(|i| i + offset),
        );

        let mut vertices = self.vertices;
        vertices.extend_from_slice(&rhs.vertices);
        Mesh::from_parts(vertices, indices, topology)
    }
}

impl Add<&Mesh> for &Mesh {
    type Output = Mesh;

    fn add(self, rhs: &Mesh) -> Mesh {
        self.clone() + rhs.clone()
    }
}

impl std::iter::Sum for Mesh {
    fn sum<I: Iterator<Item = Mesh>>(iter: I) -> Mesh {
        iter.fold(Mesh::default(), |acc, m| acc + m)
    }
}
