//! Vertex normals and the winding convention
//!
//! Winding contract: the geometric normal of triangle `(p0, p1, p2)` is
//! `(p1 - p0) × (p2 - p0)`. For a manifold sampled from `p(u, v)` that is the
//! direction of `∂p/∂v × ∂p/∂u`. Generators keep whatever orientation their
//! parametrization implies; builders that need a particular side facing out
//! call [`Mesh::orient_towards`] once instead of patching normals by hand.

use super::{Mesh, Topology};
use crate::{Error, Result};
use glam::Vec3;

impl Mesh {
    /// Smooth per-vertex normals from face cross products.
    ///
    /// Each triangle adds its unnormalized cross product to its three vertices,
    /// weighting by area, and the sums are normalized. A vertex touched only by
    /// zero-area triangles ends up with a zero normal; check with
    /// [`Mesh::require_normals`] before relying on them. Normal segment
    /// overrides are cleared. Points and lines are returned unchanged.
    pub fn compute_normals(&self) -> Self {
        if self.topology != Topology::Triangles {
            tracing::debug!(topology = ?self.topology, "normals only apply to triangle meshes");
            return self.clone();
        }

        let mut sums = vec![Vec3::ZERO; self.vertices.len()];
        for tri in self.indices.chunks_exact(3) {
            let face_normal = self.face_normal(tri);
            for &i in tri {
                sums[i as usize] += face_normal;
            }
        }

        let mut degenerate = 0usize;
        let mut mesh = self.clone();
        for (v, n) in mesh.vertices.iter_mut().zip(sums) {
            let normalized = n.normalize_or_zero();
            if normalized == Vec3::ZERO {
                degenerate += 1;
            }
            v.normal = Some(normalized);
        }
        mesh.normals = None;

        if degenerate > 0 {
            tracing::warn!(degenerate, "vertices left with zero-length normals");
        }
        mesh
    }

    /// Fail unless every vertex resolves to a usable normal
    pub fn require_normals(&self) -> Result<()> {
        for i in 0..self.vertices.len() {
            match self.normal_at(i) {
                Some(n) if n.length_squared() > f32::EPSILON => {}
                Some(_) => {
                    return Err(Error::DegenerateGeometry(format!(
                        "vertex {i} has a zero-length normal"
                    )));
                }
                None => {
                    return Err(Error::DegenerateGeometry(format!("vertex {i} has no normal")));
                }
            }
        }
        Ok(())
    }

    /// Sum of all face normals; its direction is the side the mesh faces
    pub fn area_normal(&self) -> Vec3 {
        if self.topology != Topology::Triangles {
            return Vec3::ZERO;
        }
        self.indices
            .chunks_exact(3)
            .map(|tri| self.face_normal(tri))
            .sum()
    }

    /// Reverse every triangle and negate stored normals
    pub fn flip_winding(&self) -> Self {
        if self.topology != Topology::Triangles {
            return self.clone();
        }
        let mut mesh = self.clone();
        for tri in mesh.indices.chunks_exact_mut(3) {
            tri.swap(1, 2);
        }
        for v in &mut mesh.vertices {
            v.normal = v.normal.map(|n| -n);
        }
        if let Some(table) = mesh.normals.as_mut() {
            for s in table {
                s.value = -s.value;
            }
        }
        mesh
    }

    /// Make the mesh face `direction`, flipping its winding if it faces away.
    ///
    /// Only meaningful for open, roughly flat patches; a closed surface has a
    /// near-zero area normal and is returned as is.
    pub fn orient_towards(&self, direction: Vec3) -> Self {
        if self.area_normal().dot(direction) < 0.0 {
            self.flip_winding()
        } else {
            self.clone()
        }
    }

    pub(crate) fn face_normal(&self, tri: &[u32]) -> Vec3 {
        let p0 = self.position(tri[0]);
        let p1 = self.position(tri[1]);
        let p2 = self.position(tri[2]);
        (p1 - p0).cross(p2 - p0)
    }
}

#[cfg(test)]
mod tests {
    use crate::mesh::tests::quad;
    use crate::mesh::{Mesh, Topology, Vertex};
    use crate::Error;
    use approx::assert_relative_eq;
    use glam::Vec3;

    #[test]
    fn flat_quad_normals_agree_with_winding() {
        // quad() spans +X/+Y with (lower-left, upper-left, upper-right) winding
        let mesh = quad().compute_normals();
        for v in mesh.vertices() {
            let n = v.normal.unwrap();
            assert_relative_eq!(n.z, -1.0, epsilon = 1e-6);
        }
        assert!(mesh.require_normals().is_ok());
    }

    #[test]
    fn degenerate_faces_leave_zero_normals() {
        let vertices = vec![Vertex::new(Vec3::ZERO), Vertex::new(Vec3::X), Vertex::new(Vec3::X * 2.0)];
        let mesh = Mesh::new(vertices, vec![0, 1, 2], Topology::Triangles)
            .unwrap()
            .compute_normals();
        assert_eq!(mesh.vertices()[0].normal, Some(Vec3::ZERO));
        assert!(matches!(
            mesh.require_normals(),
            Err(Error::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn lines_are_left_alone() {
        let lines = quad().convert_to(Topology::Lines).unwrap();
        assert_eq!(lines.compute_normals(), lines);
    }

    #[test]
    fn orient_flips_only_when_facing_away() {
        let mesh = quad();
        assert!(mesh.area_normal().z < 0.0);

        let up = mesh.orient_towards(Vec3::Z);
        assert!(up.area_normal().z > 0.0);
        assert_eq!(&up.indices()[..3], &[0, 2, 1]);

        let down = mesh.orient_towards(Vec3::NEG_Z);
        assert_eq!(down, mesh);
    }

    #[test]
    fn flip_negates_normal_overrides() {
        let mesh = quad().with_normal(Vec3::Z).flip_winding();
        assert_eq!(mesh.normal_at(0), Some(Vec3::NEG_Z));
    }
}
