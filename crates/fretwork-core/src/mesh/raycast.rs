//! Ray queries against triangle meshes

use super::{Mesh, Topology};
use crate::raycast::Ray;
use glam::Vec3;

/// Nearest intersection of a ray with a mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshHit {
    /// Distance along the (unit) ray direction
    pub distance: f32,
    pub position: Vec3,
    /// Geometric normal of the hit triangle, following the winding
    pub normal: Vec3,
    /// Index of the triangle (primitive number, not index offset)
    pub triangle: usize,
    /// The ray arrived against the normal
    pub front_face: bool,
}

/// Determinant threshold below which the ray is treated as parallel
const PARALLEL_EPSILON: f32 = 1e-8;

impl Mesh {
    /// Closest triangle hit in front of the ray origin.
    ///
    /// Triangles are two-sided; `front_face` reports which side was struck.
    /// Rays in the plane of a triangle miss it. Meshes that are not triangle
    /// meshes have nothing to hit.
    pub fn raycast(&self, ray: &Ray) -> Option<MeshHit> {
        if self.topology != Topology::Triangles {
            return None;
        }
        if let Some(bounds) = self.bounds {
            let (_, t_exit) = bounds.ray_interval(ray)?;
            if t_exit < 0.0 {
                return None;
            }
        }

        let mut best: Option<MeshHit> = None;
        for (n, tri) in self.indices.chunks_exact(3).enumerate() {
            let Some(t) = intersect_triangle(
                ray,
                self.position(tri[0]),
                self.position(tri[1]),
                self.position(tri[2]),
            ) else {
                continue;
            };
            if best.is_some_and(|b| b.distance <= t) {
                continue;
            }
            let normal = self.face_normal(tri).normalize_or_zero();
            best = Some(MeshHit {
                distance: t,
                position: ray.at(t),
                normal,
                triangle: n,
                front_face: normal.dot(ray.direction) < 0.0,
            });
        }
        best
    }
}

/// Möller–Trumbore, two-sided. Returns the ray parameter of the hit.
fn intersect_triangle(ray: &Ray, p0: Vec3, p1: Vec3, p2: Vec3) -> Option<f32> {
    let edge1 = p1 - p0;
    let edge2 = p2 - p0;
    let h = ray.direction.cross(edge2);
    let det = edge1.dot(h);
    if det.abs() < PARALLEL_EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = ray.origin - p0;
    let u = inv_det * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = inv_det * ray.direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = inv_det * edge2.dot(q);
    (t > 0.0).then_some(t)
}
