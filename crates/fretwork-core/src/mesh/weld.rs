//! Vertex welding by grid quantization

use super::Mesh;
use crate::{Error, Result};
use std::collections::HashMap;

impl Mesh {
    /// Merge vertices that fall into the same `epsilon`-sized grid cell.
    ///
    /// Each position is quantized to `floor(p / epsilon)` per axis and the
    /// first vertex to claim a cell absorbs every later one. Two vertices a
    /// hair apart on opposite sides of a cell boundary are not merged; the
    /// grid is fixed, not adaptive. Segment tables do not survive welding
    /// because merged vertices may come from different segments.
    pub fn weld(&self, epsilon: f32) -> Result<Self> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "weld epsilon must be positive and finite, got {epsilon}"
            )));
        }

        let mut cells: HashMap<(i64, i64, i64), u32> = HashMap::with_capacity(self.vertices.len());
        let mut remap: Vec<u32> = Vec::with_capacity(self.vertices.len());
        let mut vertices = Vec::new();

        for v in &self.vertices {
            let q = (v.position / epsilon).floor();
            let key = (q.x as i64, q.y as i64, q.z as i64);
            let index = *cells.entry(key).or_insert_with(|| {
                vertices.push(*v);
                (vertices.len() - 1) as u32
            });
            remap.push(index);
        }

        let indices = self.indices.iter().map(|&i| remap[i as usize]).collect();

        tracing::debug!(
            before = self.vertices.len(),
            after = vertices.len(),
            epsilon,
            "welded mesh"
        );

        Ok(Mesh::from_parts(vertices, indices, self.topology))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::tests::quad;
    use crate::mesh::{Topology, Vertex};
    use glam::{Mat4, Vec3};

    #[test]
    fn shared_corners_merge() {
        let a = quad();
        let b = quad().transform(&Mat4::from_translation(Vec3::X)).unwrap();
        let welded = (a + b).weld(1e-4).unwrap();
        // Two quads sharing an edge: 6 unique corners
        assert_eq!(welded.vertex_count(), 6);
        assert_eq!(welded.index_count(), 12);
        assert!(welded.indices().iter().all(|&i| (i as usize) < 6));
    }

    #[test]
    fn weld_is_idempotent() {
        let mesh = (quad() + quad()).weld(0.01).unwrap();
        assert_eq!(mesh.weld(0.01).unwrap(), mesh);
    }

    #[test]
    fn first_claimant_survives() {
        let vertices = vec![
            Vertex::new(Vec3::new(0.001, 0.0, 0.0)).with_color(Vec3::X),
            Vertex::new(Vec3::new(0.002, 0.0, 0.0)).with_color(Vec3::Y),
        ];
        let mesh = Mesh::new(vertices, vec![0, 1], Topology::Points).unwrap();
        let welded = mesh.weld(0.01).unwrap();
        assert_eq!(welded.vertex_count(), 1);
        assert_eq!(welded.vertices()[0].color, Some(Vec3::X));
        assert_eq!(welded.indices(), &[0, 0]);
    }

    #[test]
    fn neighbours_across_a_cell_boundary_stay_apart() {
        let vertices = vec![
            Vertex::new(Vec3::new(0.0099, 0.0, 0.0)),
            Vertex::new(Vec3::new(0.0101, 0.0, 0.0)),
        ];
        let mesh = Mesh::new(vertices, vec![0, 1], Topology::Lines).unwrap();
        assert_eq!(mesh.weld(0.01).unwrap().vertex_count(), 2);
    }

    #[test]
    fn rejects_non_positive_epsilon() {
        assert!(quad().weld(0.0).is_err());
        assert!(quad().weld(-1.0).is_err());
        assert!(quad().weld(f32::NAN).is_err());
    }
}
