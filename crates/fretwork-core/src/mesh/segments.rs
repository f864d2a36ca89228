//! Material and normal segment tables
//!
//! A segment table splits the vertex array into contiguous ranges. Each entry
//! stores the value for its range and the exclusive end of that range, so the
//! ends are strictly increasing and the last one equals the vertex count.

use super::Mesh;
use crate::material::MaterialId;
use crate::{Error, Result};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// One entry of a segment table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment<T> {
    pub value: T,
    /// Exclusive end of the vertex range
    pub end: usize,
}

impl<T> Segment<T> {
    pub fn new(value: T, end: usize) -> Self {
        Self { value, end }
    }
}

/// A single-material slice of a mesh, as produced by [`Mesh::material_decompose`]
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialPart {
    pub material: MaterialId,
    pub mesh: Mesh,
}

impl MaterialPart {
    pub fn new(material: MaterialId, mesh: Mesh) -> Self {
        Self { material, mesh }
    }
}

fn validate<T>(table: &[Segment<T>], vertex_count: usize, what: &str) -> Result<()> {
    let Some(last) = table.last() else {
        return Err(Error::InvalidMesh(format!("empty {what} segment table")));
    };
    if table.windows(2).any(|w| w[0].end >= w[1].end) {
        return Err(Error::InvalidMesh(format!(
            "{what} segment boundaries must be strictly increasing"
        )));
    }
    if last.end != vertex_count {
        return Err(Error::InvalidMesh(format!(
            "last {what} segment ends at {} but the mesh has {vertex_count} vertices",
            last.end
        )));
    }
    Ok(())
}

/// Iterate `(value, vertex range)` pairs of a table
fn ranges<T: Copy>(table: &[Segment<T>]) -> impl Iterator<Item = (T, Range<usize>)> + '_ {
    let mut start = 0;
    table.iter().map(move |s| {
        let range = start..s.end;
        start = s.end;
        (s.value, range)
    })
}

/// Restrict a table to `window`, rebasing ends to the window start
fn clip<T: Copy>(table: &[Segment<T>], window: &Range<usize>) -> Vec<Segment<T>> {
    ranges(table)
        .filter_map(|(value, r)| {
            let start = r.start.max(window.start);
            let end = r.end.min(window.end);
            (start < end).then(|| Segment::new(value, end - window.start))
        })
        .collect()
}

fn lookup<T: Copy>(table: &[Segment<T>], vertex: usize) -> Option<T> {
    let i = table.partition_point(|s| s.end <= vertex);
    table.get(i).map(|s| s.value)
}

impl Mesh {
    /// The material table, if any
    pub fn material_segments(&self) -> Option<&[Segment<MaterialId>]> {
        self.materials.as_deref()
    }

    /// The normal table, if any
    pub fn normal_segments(&self) -> Option<&[Segment<Vec3>]> {
        self.normals.as_deref()
    }

    /// Assign one material to every vertex. An empty mesh stays untagged.
    pub fn with_material(&self, material: MaterialId) -> Self {
        let mut mesh = self.clone();
        mesh.materials = (!self.is_empty()).then(|| vec![Segment::new(material, self.vertex_count())]);
        mesh
    }

    /// Attach a material table after checking its boundaries
    pub fn with_material_segments(&self, table: Vec<Segment<MaterialId>>) -> Result<Self> {
        validate(&table, self.vertex_count(), "material")?;
        let mut mesh = self.clone();
        mesh.materials = Some(table);
        Ok(mesh)
    }

    /// Give every vertex the same normal override. An empty mesh stays untagged.
    pub fn with_normal(&self, normal: Vec3) -> Self {
        let mut mesh = self.clone();
        mesh.normals = (!self.is_empty()).then(|| vec![Segment::new(normal, self.vertex_count())]);
        mesh
    }

    /// Attach a normal table after checking its boundaries
    pub fn with_normal_segments(&self, table: Vec<Segment<Vec3>>) -> Result<Self> {
        validate(&table, self.vertex_count(), "normal")?;
        let mut mesh = self.clone();
        mesh.normals = Some(table);
        Ok(mesh)
    }

    /// Material of a vertex: its segment's material, else the vertex attribute
    pub fn material_at(&self, vertex: usize) -> Option<MaterialId> {
        self.materials
            .as_deref()
            .and_then(|t| lookup(t, vertex))
            .or_else(|| self.vertices.get(vertex).and_then(|v| v.material))
    }

    /// Normal of a vertex: its segment's normal, else the vertex attribute
    pub fn normal_at(&self, vertex: usize) -> Option<Vec3> {
        self.normals
            .as_deref()
            .and_then(|t| lookup(t, vertex))
            .or_else(|| self.vertices.get(vertex).and_then(|v| v.normal))
    }

    /// Split into one mesh per material segment.
    ///
    /// Each part keeps the vertices of its range and the primitives whose
    /// indices all fall inside it, rebased to start at zero. A primitive that
    /// straddles two segments breaks the contract generators must honour and
    /// fails the whole decomposition.
    pub fn material_decompose(&self) -> Result<Vec<MaterialPart>> {
        let table = self.materials.as_deref().ok_or_else(|| {
            Error::MaterialSegmentViolation("mesh has no material segments".to_string())
        })?;
        let segments: Vec<(MaterialId, Range<usize>)> = ranges(table).collect();
        let mut part_indices: Vec<Vec<u32>> = vec![Vec::new(); segments.len()];

        for (n, primitive) in self.primitives().enumerate() {
            let first = primitive[0] as usize;
            let seg = segments.partition_point(|(_, r)| r.end <= first);
            let range = &segments[seg].1;
            if primitive.iter().any(|&i| !range.contains(&(i as usize))) {
                return Err(Error::MaterialSegmentViolation(format!(
                    "primitive {n} {primitive:?} crosses the boundary of segment {seg} ({range:?})"
                )));
            }
            let base = range.start as u32;
            part_indices[seg].extend(primitive.iter().map(|&i| i - base));
        }

        let parts = segments
            .into_iter()
            .zip(part_indices)
            .map(|((material, range), indices)| {
                let vertices = self.vertices[range.clone()].to_vec();
                let mut mesh = Mesh::from_parts(vertices, indices, self.topology);
                mesh.materials = (!range.is_empty()).then(|| vec![Segment::new(material, range.len())]);
                mesh.normals = self
                    .normals
                    .as_deref()
                    .map(|t| clip(t, &range))
                    .filter(|t| !t.is_empty());
                MaterialPart::new(material, mesh)
            })
            .collect();
        Ok(parts)
    }

    /// Concatenate single-material parts back into one mesh.
    ///
    /// The material table gets one segment per non-empty part. The normal
    /// table survives only when every non-empty part carries one.
    pub fn recombine<I: IntoIterator<Item = MaterialPart>>(parts: I) -> Result<Self> {
        let parts: Vec<MaterialPart> = parts.into_iter().filter(|p| !p.mesh.is_empty()).collect();
        let Some(first) = parts.first() else {
            return Ok(Mesh::default());
        };
        let topology = first.mesh.topology;
        if let Some(odd) = parts.iter().find(|p| p.mesh.topology != topology) {
            return Err(Error::InvalidMesh(format!(
                "cannot recombine {:?} part with {:?} parts",
                odd.mesh.topology, topology
            )));
        }

        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        let mut materials = Vec::with_capacity(parts.len());
        let mut normals = Some(Vec::new());

        for part in &parts {
            let offset = vertices.len();
            vertices.extend_from_slice(&part.mesh.vertices);
            indices.extend(part.mesh.indices.iter().map(|&i| i + offset as u32));
            materials.push(Segment::new(part.material, vertices.len()));

            normals = match (normals, part.mesh.normals.as_deref()) {
                (Some(mut acc), Some(table)) => {
                    acc.extend(table.iter().map(|s| Segment::new(s.value, s.end + offset)));
                    Some(acc)
                }
                _ => None,
            };
        }

        let mut mesh = Mesh::new(vertices, indices, topology)?;
        mesh.materials = Some(materials);
        mesh.normals = normals;
        Ok(mesh)
    }
}
