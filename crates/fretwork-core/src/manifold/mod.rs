//! Parametric surface generators
//!
//! Every generator samples a function of two normalized parameters on a
//! regular grid and triangulates it. `u = j / slices` runs along a row,
//! `v = i / stacks` runs across rows, and vertices are stored row by row.
//!
//! Each grid cell becomes two triangles, `(i, j) (i+1, j) (i+1, j+1)` and
//! `(i, j) (i+1, j+1) (i, j+1)`, so a face's geometric normal points along
//! `∂p/∂v × ∂p/∂u`. A plain `(u, v) -> (u, v, 0)` patch therefore faces -Z.

mod hole;

use crate::mesh::{Mesh, Topology, Vertex};
use crate::{Error, Result};
use glam::{Quat, Vec3};

pub use hole::{Separation, middle_hole_surface};

/// Sample `f(u, v)` on a `slices × stacks` grid
pub fn surface<F>(slices: u32, stacks: u32, f: F) -> Result<Mesh>
where
    F: Fn(f32, f32) -> Vec3,
{
    if slices == 0 || stacks == 0 {
        return Err(Error::InvalidParameter(format!(
            "surface needs at least one slice and one stack, got {slices}×{stacks}"
        )));
    }
    let columns = slices as u64 + 1;
    let rows = stacks as u64 + 1;
    if columns * rows > u64::from(u32::MAX) {
        return Err(Error::InvalidParameter(format!(
            "a {slices}×{stacks} grid has more vertices than u32 indices can address"
        )));
    }

    let mut vertices = Vec::with_capacity((columns * rows) as usize);
    for i in 0..=stacks {
        let v = i as f32 / stacks as f32;
        for j in 0..=slices {
            let u = j as f32 / slices as f32;
            vertices.push(Vertex::new(f(u, v)));
        }
    }

    let row = slices + 1;
    let mut indices = Vec::with_capacity(slices as usize * stacks as usize * 6);
    for i in 0..stacks {
        for j in 0..slices {
            let lower_left = i * row + j;
            let upper_left = (i + 1) * row + j;
            indices.extend_from_slice(&[
                lower_left,
                upper_left,
                upper_left + 1,
                lower_left,
                upper_left + 1,
                lower_left + 1,
            ]);
        }
    }

    tracing::debug!(
        slices,
        stacks,
        vertices = vertices.len(),
        indices = indices.len(),
        "sampled surface"
    );
    Mesh::new(vertices, indices, Topology::Triangles)
}

/// Sweep the curve `g(u)` through the family of maps `f(point, v)`
pub fn generative<G, F>(slices: u32, stacks: u32, g: G, f: F) -> Result<Mesh>
where
    G: Fn(f32) -> Vec3,
    F: Fn(Vec3, f32) -> Vec3,
{
    surface(slices, stacks, |u, v| f(g(u), v))
}

/// Translate the curve `g(u)` along `direction`, reaching it at `v = 1`
pub fn extrude<G>(slices: u32, stacks: u32, g: G, direction: Vec3) -> Result<Mesh>
where
    G: Fn(f32) -> Vec3,
{
    generative(slices, stacks, g, |p, v| p + direction * v)
}

/// Rotate the curve `g(u)` about `axis` (through the origin) by `v * angle`.
///
/// Angles below a full turn give open sweeps, e.g. a half-pipe with `PI`.
pub fn revolution<G>(slices: u32, stacks: u32, g: G, axis: Vec3, angle: f32) -> Result<Mesh>
where
    G: Fn(f32) -> Vec3,
{
    let axis = axis.try_normalize().ok_or_else(|| {
        Error::InvalidParameter(format!("revolution axis {axis:?} has no direction"))
    })?;
    if !angle.is_finite() {
        return Err(Error::InvalidParameter(format!("revolution angle {angle} is not finite")));
    }
    generative(slices, stacks, g, |p, v| {
        Quat::from_axis_angle(axis, v * angle) * p
    })
}

/// Blend linearly from `g1(u)` at `v = 0` to `g2(u)` at `v = 1`
pub fn lofted<G1, G2>(slices: u32, stacks: u32, g1: G1, g2: G2) -> Result<Mesh>
where
    G1: Fn(f32) -> Vec3,
    G2: Fn(f32) -> Vec3,
{
    surface(slices, stacks, |u, v| g1(u).lerp(g2(u), v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::{PI, TAU};

    #[test]
    fn surface_counts() {
        for (slices, stacks) in [(1, 1), (3, 2), (7, 5)] {
            let mesh = surface(slices, stacks, |u, v| Vec3::new(u, v, 0.0)).unwrap();
            assert_eq!(mesh.vertex_count(), ((slices + 1) * (stacks + 1)) as usize);
            assert_eq!(mesh.index_count(), (slices * stacks * 6) as usize);
        }
    }

    #[test]
    fn surface_rejects_empty_grids() {
        let flat = |u, v| Vec3::new(u, v, 0.0);
        assert!(matches!(surface(0, 4, flat), Err(Error::InvalidParameter(_))));
        assert!(matches!(surface(4, 0, flat), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn surface_winding_is_fixed() {
        let mesh = surface(1, 1, |u, v| Vec3::new(u, v, 0.0)).unwrap();
        assert_eq!(mesh.indices(), &[0, 2, 3, 0, 3, 1]);
        assert!(mesh.area_normal().z < 0.0);
    }

    #[test]
    fn samples_reach_both_ends() {
        let mesh = surface(4, 3, |u, v| Vec3::new(u, v, 0.0)).unwrap();
        let bounds = mesh.bounds().unwrap();
        assert_eq!(bounds.min, Vec3::ZERO);
        assert_eq!(bounds.max, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn extrude_moves_curve_along_direction() {
        let mesh = extrude(4, 2, |u| Vec3::new(u, 0.0, 0.0), Vec3::new(0.0, 0.0, 3.0)).unwrap();
        let bounds = mesh.bounds().unwrap();
        assert_relative_eq!(bounds.max.z, 3.0);
        assert_relative_eq!(bounds.max.x, 1.0);
    }

    #[test]
    fn full_revolution_bounds() {
        let mesh = revolution(8, 4, |u| Vec3::new(1.0, 0.0, u), Vec3::Z, TAU).unwrap();
        let bounds = mesh.bounds().unwrap();
        assert_relative_eq!(bounds.min.x, -1.0, epsilon = 1e-5);
        assert_relative_eq!(bounds.min.y, -1.0, epsilon = 1e-5);
        assert_relative_eq!(bounds.min.z, 0.0, epsilon = 1e-5);
        assert_relative_eq!(bounds.max.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(bounds.max.y, 1.0, epsilon = 1e-5);
        assert_relative_eq!(bounds.max.z, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn half_pipe_stays_on_one_side() {
        let mesh = revolution(8, 8, |u| Vec3::new(1.0, 0.0, u), Vec3::Z, PI).unwrap();
        let bounds = mesh.bounds().unwrap();
        assert!(bounds.min.y > -1e-5);
        assert_relative_eq!(bounds.max.y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn revolution_wall_faces_out() {
        let mesh = revolution(4, 16, |u| Vec3::new(1.0, 0.0, u), Vec3::Z, TAU)
            .unwrap()
            .compute_normals();
        for v in mesh.vertices() {
            let radial = Vec3::new(v.position.x, v.position.y, 0.0).normalize();
            assert!(v.normal.unwrap().dot(radial) > 0.9);
        }
    }

    #[test]
    fn revolution_rejects_zero_axis() {
        let line = |u| Vec3::new(1.0, 0.0, u);
        assert!(revolution(4, 4, line, Vec3::ZERO, PI).is_err());
    }

    #[test]
    fn loft_interpolates_between_curves() {
        let mesh = lofted(
            2,
            2,
            |u| Vec3::new(u, 0.0, 0.0),
            |u| Vec3::new(u * 2.0, 1.0, 0.0),
        )
        .unwrap();
        // middle row, last column: halfway between (1,0,0) and (2,1,0)
        let p = mesh.vertices()[5].position;
        assert_relative_eq!(p.x, 1.5);
        assert_relative_eq!(p.y, 0.5);
    }
}
