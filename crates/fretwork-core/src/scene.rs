//! Placed shapes ready for a renderer or exporter
//!
//! The kernel does not own a scene. A [`SceneEntry`] is what it hands over:
//! a mesh or CSG solid, its fallback material and its world transform, with a
//! ray query that answers in world space.

use crate::csg::CsgNode;
use crate::material::MaterialId;
use crate::mesh::Mesh;
use crate::raycast::Ray;
use crate::transform;
use crate::{Error, Result};
use glam::{Mat4, Vec3, Vec4};

/// Geometry of a scene entry
#[derive(Debug, Clone)]
pub enum SceneShape {
    Mesh(Mesh),
    Csg(CsgNode),
}

impl From<Mesh> for SceneShape {
    fn from(mesh: Mesh) -> Self {
        SceneShape::Mesh(mesh)
    }
}

impl From<CsgNode> for SceneShape {
    fn from(node: CsgNode) -> Self {
        SceneShape::Csg(node)
    }
}

/// Nearest hit on a scene entry, in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneHit {
    pub distance: f32,
    pub position: Vec3,
    pub normal: Vec3,
    /// Material of the surface hit, falling back to the entry's material
    pub material: Option<MaterialId>,
    pub front_face: bool,
}

/// A shape placed in the world
#[derive(Debug, Clone)]
pub struct SceneEntry {
    pub shape: SceneShape,
    pub material: Option<MaterialId>,
    transform: Mat4,
    inverse: Mat4,
}

impl SceneEntry {
    /// Place a shape with an affine, invertible transform
    pub fn new(shape: impl Into<SceneShape>, transform: Mat4) -> Result<Self> {
        if !transform.row(3).abs_diff_eq(Vec4::W, 1e-6) {
            return Err(Error::InvalidParameter(
                "scene entry transform is projective; entries need affine placements".to_string(),
            ));
        }
        if !transform.is_finite() || transform.determinant().abs() <= f32::EPSILON {
            return Err(Error::DegenerateGeometry(
                "scene entry transform is not invertible".to_string(),
            ));
        }
        Ok(Self {
            shape: shape.into(),
            material: None,
            inverse: transform.inverse(),
            transform,
        })
    }

    pub fn with_material(mut self, material: MaterialId) -> Self {
        self.material = Some(material);
        self
    }

    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    /// Nearest surface in front of a world-space ray
    pub fn raycast(&self, ray: &Ray) -> Option<SceneHit> {
        let local = ray.transformed(&self.inverse);
        let scale = ray.direction.length();

        let (t, normal, material, front_face) = match &self.shape {
            SceneShape::Mesh(mesh) => {
                let hit = mesh.raycast(&local)?;
                let first = mesh.indices()[hit.triangle * 3] as usize;
                (hit.distance, hit.normal, mesh.material_at(first), hit.front_face)
            }
            SceneShape::Csg(node) => {
                let hit = node.raycast(&local)?;
                (hit.distance / local.direction.length(), hit.normal, hit.material, hit.front_face)
            }
        };

        Some(SceneHit {
            distance: t * scale,
            position: ray.at(t),
            normal: transform::transform_normal(&self.inverse, normal),
            material: material.or(self.material),
            front_face,
        })
    }
}
